use crate::models::{CommentDetail, CommentInput, Post, PostDetail, PostFilter, PostInput};
use crate::services::validation::Validate;
use crate::services::{comments, posts};
use crate::web::error::AppResult;
use crate::web::extractors::{CurrentUser, Found, Validated};
use crate::web::pagination::{Page, Pager};
use crate::web::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// GET /blogs/posts
pub async fn list(
    State(state): State<Arc<AppState>>,
    pager: Pager,
    Query(filter): Query<PostFilter>,
) -> AppResult<Json<Page<PostDetail>>> {
    filter.validate(false)?;
    let count = posts::count(&state.db, &filter)?;
    pager.check(count)?;
    let results = posts::list(&state.db, &filter, pager.limit(), pager.offset())?;
    Ok(Json(pager.page(count, results)))
}

/// POST /blogs/posts
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Validated { data, .. }: Validated<PostInput>,
) -> AppResult<impl IntoResponse> {
    let post = posts::create(&state.db, user.id, &data)?;
    let location = format!("/blogs/posts/{}", post.slug);
    let detail = posts::detail(&state.db, post)?;
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(detail)))
}

/// GET /blogs/posts/:slug
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Found(post): Found<Post>,
) -> AppResult<Json<PostDetail>> {
    Ok(Json(posts::detail(&state.db, post)?))
}

/// PUT and PATCH /blogs/posts/:slug
pub async fn update(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Found(current): Found<Post>,
    Validated { data, .. }: Validated<PostInput>,
) -> AppResult<Json<PostDetail>> {
    let post = posts::update(&state.db, &current, &data)?;
    Ok(Json(posts::detail(&state.db, post)?))
}

/// DELETE /blogs/posts/:slug
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Found(post): Found<Post>,
) -> AppResult<StatusCode> {
    posts::soft_delete(&state.db, post.id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /blogs/posts/:slug/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Found(post): Found<Post>,
) -> AppResult<Json<Vec<CommentDetail>>> {
    Ok(Json(comments::list_for_post(&state.db, &post)?))
}

/// POST /blogs/posts/:slug/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Found(post): Found<Post>,
    Validated { data, .. }: Validated<CommentInput>,
) -> AppResult<(StatusCode, Json<CommentDetail>)> {
    let comment = comments::create(&state.db, &post, user.id, &data)?;
    Ok((StatusCode::CREATED, Json(comment)))
}
