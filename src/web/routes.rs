use super::handlers::{self, posts, terms};
use super::state::AppState;
use crate::models::{Category, Tag, Taxonomy};
use crate::services::lookup::Lookup;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

fn term_routes<T: Taxonomy + Lookup>() -> Router<Arc<AppState>> {
    let item = format!("{}/:id", T::COLLECTION_PATH);
    Router::new()
        .route(
            T::COLLECTION_PATH,
            get(terms::list::<T>).post(terms::create::<T>),
        )
        .route(
            &item,
            get(terms::retrieve::<T>)
                .put(terms::update::<T>)
                .patch(terms::update::<T>)
                .delete(terms::destroy::<T>),
        )
}

pub fn blog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(term_routes::<Category>())
        .merge(term_routes::<Tag>())
        .route("/blogs/posts", get(posts::list).post(posts::create))
        .route(
            "/blogs/posts/:slug",
            get(posts::retrieve)
                .put(posts::update)
                .patch(posts::update)
                .delete(posts::destroy),
        )
        .route(
            "/blogs/posts/:slug/comments",
            get(posts::list_comments).post(posts::create_comment),
        )
}

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/refresh", post(handlers::auth::refresh))
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health))
}
