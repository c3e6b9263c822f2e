// src/errors.rs
// Error handling for the grader: chunking, extraction, config and chat API

use thiserror::Error;

/// Result type for grader operations
pub type GraderResult<T> = Result<T, GraderError>;

#[derive(Debug, Error)]
pub enum GraderError {
    // Caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Text extraction
    #[error("Source unreadable: {source_name} - {reason}")]
    SourceUnreadable { source_name: String, reason: String },

    // Chat API
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Chat API request failed: {0}")]
    Upstream(String),

    #[error("Invalid chat API response: {0}")]
    InvalidResponse(String),

    // Configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraderError {
    /// Short machine-readable name, used in JSON error bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::SourceUnreadable { .. } => "source_unreadable",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Upstream(_) => "upstream",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Config(_) => "config",
        }
    }

    pub fn unreadable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnreadable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraderError::unreadable("docs/lang.pdf", "file not found");
        assert_eq!(
            err.to_string(),
            "Source unreadable: docs/lang.pdf - file not found"
        );
        assert_eq!(err.kind(), "source_unreadable");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(GraderError::InvalidArgument("x".into()).kind(), "invalid_argument");
        assert_eq!(GraderError::Unauthenticated("x".into()).kind(), "unauthenticated");
        assert_eq!(GraderError::Config("x".into()).kind(), "config");
    }
}
