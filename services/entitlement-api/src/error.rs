//! Error types for the Entitlement API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tally_entitlement_core::EntitlementError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Free tier limited to {limit} active habits")]
    UpgradeRequired { limit: i64 },

    #[error("Service is in maintenance mode")]
    Maintenance,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(#[from] tally_db::DbError),

    #[error("Entitlement error")]
    Entitlement(EntitlementError),
}

impl From<EntitlementError> for ApiError {
    fn from(e: EntitlementError) -> Self {
        match e {
            EntitlementError::AccountNotFound => Self::AccountNotFound,
            EntitlementError::UpgradeRequired { limit } => Self::UpgradeRequired { limit },
            EntitlementError::Database(e) => Self::Database(e),
            other => Self::Entitlement(other),
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpgradeRequired { .. } => StatusCode::FORBIDDEN,
            Self::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) | Self::Database(_) | Self::Entitlement(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UpgradeRequired { .. } => "UPGRADE_REQUIRED",
            Self::Maintenance => "MAINTENANCE",
            Self::Internal(_) | Self::Database(_) | Self::Entitlement(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if matches!(
            self,
            Self::Internal(_) | Self::Database(_) | Self::Entitlement(_)
        ) {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
