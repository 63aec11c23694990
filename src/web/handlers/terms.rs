//! Handlers shared by every `Taxonomy` collection (categories, tags).

use crate::models::{TermInput, Taxonomy};
use crate::services::lookup::Lookup;
use crate::services::taxonomy;
use crate::web::error::AppResult;
use crate::web::extractors::{CurrentUser, Found, Validated};
use crate::web::pagination::{Page, Pager};
use crate::web::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

pub async fn list<T: Taxonomy>(
    State(state): State<Arc<AppState>>,
    pager: Pager,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Page<T>>> {
    let search = params.search.as_deref();
    let count = taxonomy::count::<T>(&state.db, search)?;
    pager.check(count)?;
    let results = taxonomy::list::<T>(&state.db, search, pager.limit(), pager.offset())?;
    Ok(Json(pager.page(count, results)))
}

pub async fn create<T: Taxonomy>(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Validated { data, .. }: Validated<TermInput<T>>,
) -> AppResult<impl IntoResponse> {
    let term = taxonomy::create::<T>(&state.db, &data)?;
    tracing::debug!(user_id = user.id, "{} created via API", T::VERBOSE_NAME);
    let location = format!("{}/{}", T::COLLECTION_PATH, term.id());
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(term)))
}

pub async fn retrieve<T: Taxonomy + Lookup>(Found(term): Found<T>) -> Json<T> {
    Json(term)
}

pub async fn update<T: Taxonomy + Lookup>(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Found(current): Found<T>,
    Validated { data, .. }: Validated<TermInput<T>>,
) -> AppResult<Json<T>> {
    let term = taxonomy::update::<T>(&state.db, &current, &data)?;
    Ok(Json(term))
}

pub async fn destroy<T: Taxonomy + Lookup>(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Found(term): Found<T>,
) -> AppResult<StatusCode> {
    taxonomy::soft_delete::<T>(&state.db, term.id())?;
    Ok(StatusCode::NO_CONTENT)
}
