use crate::services::lookup::{LookupError, LookupFailure};
use crate::services::token::TokenError;
use crate::services::validation::FieldErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Invalid(FieldErrors),
    #[error("{0}")]
    Malformed(String),
    #[error("{0}")]
    Missing(FieldErrors),
    #[error("Invalid page.")]
    InvalidPage,
    #[error("{detail}")]
    Unauthorized {
        detail: &'static str,
        code: Option<&'static str>,
    },
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_authenticated() -> Self {
        Self::Unauthorized {
            detail: "Authentication credentials were not provided.",
            code: None,
        }
    }

    pub fn token_not_valid() -> Self {
        Self::Unauthorized {
            detail: "Given token not valid for any token type",
            code: Some("token_not_valid"),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err.failure {
            LookupFailure::NotFound => Self::Missing(err.field_errors()),
            LookupFailure::Malformed | LookupFailure::Multiple => Self::Invalid(err.field_errors()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<FieldErrors>() {
            Ok(errors) => return Self::Invalid(errors),
            Err(err) => err,
        };
        let err = match err.downcast::<LookupError>() {
            Ok(lookup) => return lookup.into(),
            Err(err) => err,
        };
        if let Some(rusqlite::Error::SqliteFailure(code, message)) =
            err.downcast_ref::<rusqlite::Error>()
        {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                let message = message
                    .clone()
                    .unwrap_or_else(|| "Constraint violation.".to_string());
                return Self::Invalid(FieldErrors::single("non_field_errors", message));
            }
        }
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Invalid(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::Malformed(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            Self::Missing(errors) => (StatusCode::NOT_FOUND, Json(errors)).into_response(),
            Self::InvalidPage => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Invalid page." }))).into_response()
            }
            Self::Unauthorized { detail, code } => {
                let body = match code {
                    Some(code) => json!({ "detail": detail, "code": code }),
                    None => json!({ "detail": detail }),
                };
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
            Self::Internal(err) => {
                tracing::error!("Application error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, ApiError>;
