//! Error taxonomy shared by every operation, mapped onto HTTP in one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or conflicting request fields; the operation was not attempted.
    #[error("{0}")]
    Validation(String),

    /// The entity does not exist, is soft-deleted, or is unavailable.
    #[error("{0}")]
    NotFound(String),

    /// The entity exists but does not belong to the caller.
    #[error("{0}")]
    Forbidden(String),

    /// A state rule rejected the operation: cancelling a settled order,
    /// refunding a non-completed payment, redeeming an exhausted coupon.
    #[error("{0}")]
    Conflict(String),

    #[error("payment gateway error: {0}")]
    Gateway(String),

    #[error("storage error")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Storage details are logged, never surfaced to the client.
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "storage failure");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(serde_json::json!({ "ok": false, "error": message }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(Error::Database(sqlx::Error::PoolClosed).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
