//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Every failure is classified into an [`ErrorKind`], which is what stage
//! results and HTTP responses expose to callers.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of bytes of an upstream body kept in logs and diagnostics.
pub const DIAGNOSTIC_BODY_LIMIT: usize = 500;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("No artifact returned: {0}")]
    NoArtifactReturned(String),

    #[error("Interpretation failed: {0}")]
    InterpretationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("S3 storage error: {0}")]
    S3(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    PayloadTooLarge,
    UnsupportedMediaType,
    SourceUnavailable,
    UpstreamUnavailable,
    TranscriptionFailed,
    GenerationFailed,
    NoArtifactReturned,
    InterpretationFailed,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::ValidationError | ErrorKind::UnsupportedMediaType => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::SourceUnavailable => StatusCode::NOT_FOUND,
            ErrorKind::UpstreamUnavailable
            | ErrorKind::TranscriptionFailed
            | ErrorKind::GenerationFailed
            | ErrorKind::NoArtifactReturned
            | ErrorKind::InterpretationFailed
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::ValidationError,
            Error::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Error::UnsupportedMediaType(_) => ErrorKind::UnsupportedMediaType,
            Error::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            Error::UpstreamUnavailable(_) | Error::Http(_) => ErrorKind::UpstreamUnavailable,
            Error::TranscriptionFailed(_) => ErrorKind::TranscriptionFailed,
            Error::GenerationFailed(_) => ErrorKind::GenerationFailed,
            Error::NoArtifactReturned(_) => ErrorKind::NoArtifactReturned,
            Error::InterpretationFailed(_) => ErrorKind::InterpretationFailed,
            Error::Io(_)
            | Error::Serialization(_)
            | Error::S3(_)
            | Error::Config(_)
            | Error::Invariant(_) => ErrorKind::Internal,
        }
    }

    /// Re-tag provider-level failures as a stage failure.
    ///
    /// Errors that already carry a caller-meaningful kind (validation, missing
    /// source, unusable payload, or another stage failure) pass through.
    pub fn into_stage_failure(self, stage: fn(String) -> Error) -> Error {
        match self {
            Error::Validation(_)
            | Error::PayloadTooLarge { .. }
            | Error::UnsupportedMediaType(_)
            | Error::SourceUnavailable(_)
            | Error::NoArtifactReturned(_)
            | Error::TranscriptionFailed(_)
            | Error::GenerationFailed(_)
            | Error::InterpretationFailed(_) => self,
            other => stage(other.to_string()),
        }
    }
}

/// Cut an upstream body down to a loggable size on a char boundary.
pub fn truncate_body(body: &str) -> String {
    if body.len() <= DIAGNOSTIC_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = DIAGNOSTIC_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &body[..end], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(
            Error::Validation("x".into()).kind().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::PayloadTooLarge { size: 2, limit: 1 }.kind().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            Error::UnsupportedMediaType("text/plain".into())
                .kind()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::SourceUnavailable("gone".into()).kind().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::NoArtifactReturned("{}".into()).kind().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_stage_failure_reclassifies_upstream() {
        let err = Error::UpstreamUnavailable("502".into())
            .into_stage_failure(Error::GenerationFailed);
        assert!(matches!(err, Error::GenerationFailed(ref m) if m.contains("502")));
    }

    #[test]
    fn test_into_stage_failure_keeps_typed_errors() {
        let err = Error::NoArtifactReturned("no url".into())
            .into_stage_failure(Error::GenerationFailed);
        assert_eq!(err.kind(), ErrorKind::NoArtifactReturned);

        let err = Error::SourceUnavailable("missing".into())
            .into_stage_failure(Error::TranscriptionFailed);
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn test_truncate_body_short_is_unchanged() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn test_truncate_body_long_is_cut() {
        let body = "é".repeat(DIAGNOSTIC_BODY_LIMIT);
        let cut = truncate_body(&body);
        assert!(cut.len() < body.len());
        assert!(cut.contains("bytes total"));
    }
}
