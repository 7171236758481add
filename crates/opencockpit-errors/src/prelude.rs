//! Prelude module for convenient error handling imports.
//!
//! ```
//! use opencockpit_errors::prelude::*;
//!
//! fn observe(value: Option<f64>) -> ObserverResult {
//!     value
//!         .map(|_| ())
//!         .ok_or_else(|| ObserverError::type_mismatch("number", "text"))
//! }
//!
//! assert!(observe(Some(1.0)).is_ok());
//! assert!(observe(None).is_err_and(|e| e.severity().is_recoverable()));
//! ```

pub use crate::{
    ObserverResult, config::ConfigError, decode::DecodeError, observer::ObserverError,
    severity::ErrorSeverity,
};
