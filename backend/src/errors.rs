use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::pipeline::SubmitError;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("wallet required: {0}")]
    WalletRequired(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// The contract or node refused the call. The message is safe to show.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("internal error")]
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::WalletRequired(m) => (StatusCode::FORBIDDEN, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        };

        (status, Json(ErrorBody { error: msg })).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        let msg = e.user_message();
        match e {
            SubmitError::WalletRequired => ApiError::WalletRequired(msg),
            SubmitError::Invalid(_) => ApiError::BadRequest(msg),
            SubmitError::InFlight => ApiError::Conflict(msg),
            SubmitError::Failed(_) => ApiError::BadGateway(msg),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotConnected => ApiError::WalletRequired(crate::notice::WALLET_REQUIRED.to_string()),
            GatewayError::Malformed(m) => ApiError::BadRequest(m.to_string()),
            GatewayError::NotAView { .. } => ApiError::Internal,
            GatewayError::Rejected { function, .. } | GatewayError::UnexpectedOutput { function } => {
                ApiError::BadGateway(format!("{function} failed"))
            }
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        tracing::error!(error = %e, "configuration error");
        ApiError::Internal
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database error");
        ApiError::Internal
    }
}
