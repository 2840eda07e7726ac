//! Domain-error-to-status-code mapping (spec §7: "HTTP handlers translate
//! domain errors to status codes via a single mapping table; no raw DB
//! error reaches the client").

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lodestone_types::error::{Categorized, ErrorCategory};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Db(#[from] lodestone_db::DbError),

    #[error(transparent)]
    Players(#[from] lodestone_players::PlayersError),

    #[error(transparent)]
    Billing(#[from] lodestone_billing::BillingError),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,
}

impl Categorized for ApiError {
    fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Db(e) => e.category(),
            ApiError::Players(e) => e.category(),
            ApiError::Billing(e) => e.category(),
            ApiError::NotFound => ErrorCategory::Internal,
            ApiError::BadRequest(_) => ErrorCategory::Internal,
            ApiError::Unauthorized | ApiError::Forbidden => ErrorCategory::AuthZ,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Db(lodestone_db::DbError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Db(lodestone_db::DbError::InvariantViolation(_)) => StatusCode::CONFLICT,
            _ => match self.category() {
                ErrorCategory::AuthZ => StatusCode::UNAUTHORIZED,
                ErrorCategory::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        // Internal errors never leak their Display string (spec §7.8):
        // a fixed short reason goes to the client, the real error to logs.
        let message = if self.category().is_client_visible() {
            self.to_string()
        } else {
            tracing::error!(error = %self, "internal error");
            "internal error".to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
