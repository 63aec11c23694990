use crate::models::{LoginRequest, NewUser, RefreshRequest, RegisterRequest, UserProfile};
use crate::services::auth;
use crate::services::token::TokenType;
use crate::web::error::{ApiError, AppResult};
use crate::web::extractors::{CurrentUser, Validated};
use crate::web::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Validated { data, .. }: Validated<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = auth::authenticate(
        &state.db,
        data.email.as_deref().unwrap_or_default(),
        data.password.as_deref().unwrap_or_default(),
    )?;
    let pair = state.tokens.issue_pair(user.id)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token: pair.access,
        refresh_token: pair.refresh,
    }))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Validated { data, .. }: Validated<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let new_user = NewUser {
        email: data.email.unwrap_or_default(),
        password: data.password.unwrap_or_default(),
        first_name: data.first_name.unwrap_or_default(),
        last_name: data.last_name.unwrap_or_default(),
        ..Default::default()
    };
    let user = auth::create_user(&state.db, &new_user)?;
    let pair = state.tokens.issue_pair(user.id)?;

    Ok(Json(RegisterResponse {
        id: user.id,
        email: user.email,
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Validated { data, .. }: Validated<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let token = data.refresh.as_deref().unwrap_or_default();
    let claims = state
        .tokens
        .verify(token, TokenType::Refresh)
        .map_err(|e| {
            tracing::debug!("Rejected refresh token: {}", e);
            ApiError::Unauthorized {
                detail: "Token is invalid or expired",
                code: Some("token_not_valid"),
            }
        })?;

    let user = auth::get_user(&state.db, claims.user_id)?.ok_or(ApiError::Unauthorized {
        detail: "User not found",
        code: Some("user_not_found"),
    })?;
    if !user.is_active {
        return Err(ApiError::Unauthorized {
            detail: "User is inactive",
            code: Some("user_inactive"),
        });
    }

    let access = state.tokens.issue(user.id, TokenType::Access)?;
    Ok(Json(RefreshResponse { access }))
}
