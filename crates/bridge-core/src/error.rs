//! Error types for the bridge core.

use thiserror::Error;

/// Failure of the AI collaborator call itself (TransportFailure).
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI API error {0}: {1}")]
    Status(u16, String),

    #[error("AI response parse failed: {0}")]
    Decode(String),

    #[error("AI returned an empty reply")]
    EmptyReply,
}

/// AI reply that does not fit the required schema shape (ValidationFailure).
#[derive(Error, Debug)]
#[error("AI reply failed validation: {0}")]
pub struct ValidationError(pub String);

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError(err.to_string())
    }
}

/// Matching engine failure.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("scoring failed: {0}")]
    Scoring(String),
}
