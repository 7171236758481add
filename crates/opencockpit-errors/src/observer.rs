//! Observer failure types.
//!
//! Observers are the mapping actions and effect inputs registered against a
//! field path. A failing observer is reported to the dispatcher's error sink
//! and never prevents the remaining observers from running.

use crate::severity::ErrorSeverity;

/// Failure raised by a single observer invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObserverError {
    /// The dispatched value has a type the observer cannot interpret
    #[error("Expected {expected} value, got {found}")]
    TypeMismatch {
        /// Type the observer needs
        expected: &'static str,
        /// Type that was dispatched
        found: &'static str,
    },

    /// Observer-specific failure
    #[error("{0}")]
    Failed(String),
}

impl ObserverError {
    /// Create a type mismatch error.
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        ObserverError::TypeMismatch { expected, found }
    }

    /// Create a generic observer failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        ObserverError::Failed(reason.into())
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ObserverError::TypeMismatch { .. } => ErrorSeverity::Warning,
            ObserverError::Failed(_) => ErrorSeverity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_display() {
        let err = ObserverError::type_mismatch("number", "text");
        assert_eq!(err.to_string(), "Expected number value, got text");
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_failed_is_recoverable_error() {
        let err = ObserverError::failed("device busy");
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.severity().is_recoverable());
    }
}
