//! Error types for sqlport.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslateError {
    /// The scanner hit an unterminated literal, identifier, or comment.
    /// The translator refuses to rewrite on top of a guess.
    #[error("Malformed input at position {position}: {message}")]
    MalformedInput { position: usize, message: String },

    /// An ON DUPLICATE KEY UPDATE clause with no conflict-key hint for the
    /// target table. MySQL does not name the key; guessing it would silently
    /// change update semantics.
    #[error("Ambiguous upsert on table '{table}': no conflict-key hint supplied")]
    AmbiguousUpsert { table: String },

    /// A recognized source-dialect construct the catalog cannot rewrite,
    /// returned with the offending text so callers can patch the catalog.
    #[error("Unsupported construct at position {position}: {construct}")]
    UnsupportedConstruct { position: usize, construct: String },

    /// A rule broke a pipeline invariant (placeholder count drift, a pass
    /// that never converges). Always a bug in a rule, never swallowed.
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    /// Create a malformed-input error at the given position.
    pub fn malformed(position: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            position,
            message: message.into(),
        }
    }

    /// Create an unsupported-construct error at the given position.
    pub fn unsupported(position: usize, construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            position,
            construct: construct.into(),
        }
    }
}

/// Result type alias for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslateError::malformed(5, "unterminated string literal");
        assert_eq!(
            err.to_string(),
            "Malformed input at position 5: unterminated string literal"
        );
    }

    #[test]
    fn test_unsupported_display() {
        let err = TranslateError::unsupported(12, "DATE_ADD(ts, 3)");
        assert_eq!(
            err.to_string(),
            "Unsupported construct at position 12: DATE_ADD(ts, 3)"
        );
    }
}
