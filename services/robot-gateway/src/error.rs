use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::{EngineError, HubError};

/// Central error type for the HTTP surface
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::ServiceUnavailable(err.to_string())
    }
}

impl From<HubError> for AppError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::UnknownSession(_) => AppError::NotFound(err.to_string()),
            HubError::Closed => AppError::ServiceUnavailable(err.to_string()),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                msg,
                "SERVICE_UNAVAILABLE",
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_closed_is_unavailable() {
        let response = AppError::from(EngineError::Closed).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_hub_errors_map_to_status() {
        let closed = AppError::from(HubError::Closed).into_response();
        assert_eq!(closed.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unknown = AppError::from(HubError::UnknownSession(types::ids::SessionId::new()));
        assert_eq!(unknown.into_response().status(), StatusCode::NOT_FOUND);
    }
}
