//! Client-facing errors. Everything else degrades to a fallback inside the core.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_voice::VoiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing client input.
    #[error("{0}")]
    BadRequest(String),

    /// The speech-to-text collaborator failed.
    #[error("transcription failed: {0}")]
    Transcription(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Transcription(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::BadRequest(msg) => tracing::warn!("rejected request: {}", msg),
            ApiError::Transcription(msg) => tracing::error!("transcription failed: {}", msg),
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Config(msg) => ApiError::BadRequest(msg),
            other => ApiError::Transcription(other.to_string()),
        }
    }
}
