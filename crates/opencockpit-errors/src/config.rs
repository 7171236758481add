//! Configuration error types.

/// Errors raised while loading or validating configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File content could not be parsed
    #[error("Failed to parse {origin}: {reason}")]
    Parse {
        /// File path or other origin label
        origin: String,
        /// Parser message
        reason: String,
    },

    /// A value failed validation
    #[error("Invalid value for '{field}': {reason}")]
    Invalid {
        /// Dotted path of the offending setting
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create a read error.
    pub fn read(path: impl Into<String>, source: std::io::Error) -> Self {
        ConfigError::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error.
    pub fn parse(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Parse {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
