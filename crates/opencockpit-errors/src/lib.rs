//! Centralized error types for OpenCockpit
//!
//! Every failure the telemetry core can produce is recoverable: a bad datagram
//! is dropped, a failing observer is isolated, and a stale link is a state
//! transition rather than an error. This crate gives those failures names so
//! that they can be counted, logged and surfaced to a caller-supplied sink.
//!
//! # Architecture
//!
//! - [`decode`]: Frame decoder failures (one dropped unit of input each)
//! - [`observer`]: Failures raised by dispatch observers and effect logic
//! - [`config`]: Configuration loading and validation errors
//! - [`severity`]: Shared severity scale used when logging
//!
//! # Example
//!
//! ```
//! use opencockpit_errors::prelude::*;
//!
//! fn parse_gain(value: f32) -> Result<f32, ConfigError> {
//!     if !value.is_finite() || value < 0.0 {
//!         return Err(ConfigError::invalid("haptics.gains.b", "gain must be finite and >= 0"));
//!     }
//!     Ok(value)
//! }
//!
//! assert!(parse_gain(1.4).is_ok());
//! assert!(parse_gain(-1.0).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod decode;
pub mod observer;
pub mod prelude;
pub mod severity;

pub use config::ConfigError;
pub use decode::DecodeError;
pub use observer::ObserverError;
pub use severity::ErrorSeverity;

/// Result type returned by dispatch observers.
pub type ObserverResult<T = ()> = std::result::Result<T, ObserverError>;
