use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use corral_core::UnknownSourceKind;
use corral_feeds::FeedError;

/// Errors a handler can answer with. Every variant renders as
/// `{"detail": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    UnknownEnvironment(#[from] UnknownSourceKind),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnknownEnvironment(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Feed(FeedError::UnknownSource(_)) => StatusCode::BAD_REQUEST,
            ApiError::Feed(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Feed(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Feed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
