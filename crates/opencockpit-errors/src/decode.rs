//! Frame decoder error types.
//!
//! A decode error always describes exactly one dropped unit of input (one
//! datagram, one metadata block or one truncated record). The decoder's last-value cache is never
//! modified by a unit that fails to decode.

use crate::severity::ErrorSeverity;

/// Errors produced while turning raw datagrams into change events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload is empty
    #[error("Datagram is empty")]
    Empty,

    /// Payload is not valid UTF-8
    #[error("Datagram is not valid UTF-8: {0}")]
    NotUtf8(String),

    /// Payload is not valid JSON
    #[error("Invalid JSON at line {line}, column {column}: {reason}")]
    InvalidJson {
        /// Line of the first syntax error
        line: usize,
        /// Column of the first syntax error
        column: usize,
        /// Parser message
        reason: String,
    },

    /// Payload parsed but the top level is not a key/value document
    #[error("Top-level value is not a key/value document")]
    NotADocument,

    /// Identity metadata block exceeded its size cap
    #[error("Identity metadata exceeded {limit} bytes and was discarded")]
    MetadataOverflow {
        /// Maximum accumulated metadata size
        limit: usize,
    },

    /// A record's payload was cut short by the next sync marker
    #[error("Record at {address:#06X} declared {declared} bytes, sync after {received}")]
    TruncatedRecord {
        /// Base address from the record header
        address: u16,
        /// Payload length from the record header
        declared: usize,
        /// Payload bytes before the sync marker
        received: usize,
    },
}

impl DecodeError {
    /// Create an invalid JSON error from parser position and message.
    pub fn invalid_json(line: usize, column: usize, reason: impl Into<String>) -> Self {
        DecodeError::InvalidJson {
            line,
            column,
            reason: reason.into(),
        }
    }

    /// Get the error severity.
    ///
    /// Every decode error is a warning: the failing unit is dropped and the
    /// decoder resumes with the next input.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    /// Short stable label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::Empty => "empty",
            DecodeError::NotUtf8(_) => "not_utf8",
            DecodeError::InvalidJson { .. } => "invalid_json",
            DecodeError::NotADocument => "not_a_document",
            DecodeError::MetadataOverflow { .. } => "metadata_overflow",
            DecodeError::TruncatedRecord { .. } => "truncated_record",
        }
    }
}
