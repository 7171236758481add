//! Error severity shared by the per-domain error types.

use std::fmt;

/// Error severity level.
///
/// Decode and observer failures never reach [`ErrorSeverity::Critical`]: the
/// failing unit is dropped or the failing observer skipped, and processing
/// continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the unit of work was dropped but processing continues
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the enclosing process should decide whether to continue
    Critical = 3,
}

impl ErrorSeverity {
    /// Whether processing continues after an error of this severity.
    pub fn is_recoverable(self) -> bool {
        self < ErrorSeverity::Critical
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
