use crate::models::User;
use crate::services::auth;
use crate::services::lookup::{self, Lookup};
use crate::services::token::TokenType;
use crate::services::validation::Validate;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::Method;
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The live, active user behind a `Bearer` access token.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        Box::pin(async move {
            let TypedHeader(Authorization(bearer)) =
                TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, &state)
                    .await
                    .map_err(|_| ApiError::not_authenticated())?;

            let claims = state
                .tokens
                .verify(bearer.token(), TokenType::Access)
                .map_err(|e| {
                    tracing::debug!("Rejected access token: {}", e);
                    ApiError::token_not_valid()
                })?;

            let user = auth::get_user(&state.db, claims.user_id)?.ok_or(
                ApiError::Unauthorized {
                    detail: "User not found",
                    code: Some("user_not_found"),
                },
            )?;
            if !user.is_active {
                return Err(ApiError::Unauthorized {
                    detail: "User is inactive",
                    code: Some("user_inactive"),
                });
            }

            Ok(CurrentUser(user))
        })
    }
}

/// A JSON body that passed `Validate`. `partial` is set for PATCH.
pub struct Validated<T> {
    pub data: T,
    pub partial: bool,
}

impl<T, S> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request<'life0, 'async_trait>(
        req: Request,
        state: &'life0 S,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let partial = req.method() == Method::PATCH;
            let Json(data) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    ApiError::Malformed(format!("JSON parse error - {}", rejection.body_text()))
                })?;
            data.validate(partial)?;
            Ok(Validated { data, partial })
        })
    }
}

/// The single live row addressed by the last path segment.
pub struct Found<T>(pub T);

impl<T> FromRequestParts<Arc<AppState>> for Found<T>
where
    T: Lookup + Send,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        Box::pin(async move {
            let Path(key) = Path::<String>::from_request_parts(parts, &state)
                .await
                .map_err(|rejection| ApiError::Malformed(rejection.body_text()))?;
            let row = lookup::find_one::<T>(&state.db, &key)?;
            Ok(Found(row))
        })
    }
}
