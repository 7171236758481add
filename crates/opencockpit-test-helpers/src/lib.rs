//! Shared test utilities for OpenCockpit.
//!
//! This crate provides common test helpers, assertions, and fixtures
//! to reduce code duplication across the test suite.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`assertions`] - Custom assertion macros for testing
//! - [`mock`] - Recording output sink and observers
//! - [`fixtures`] - DCS-BIOS stream and Export.lua document builders
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! opencockpit-test-helpers = { workspace = true }
//! ```
//!
//! Then import the prelude:
//!
//! ```rust,ignore
//! use opencockpit_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod assertions;
pub mod must;
pub mod prelude;

#[cfg(feature = "mock")]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;

#[cfg(feature = "fixtures")]
#[cfg_attr(docsrs, doc(cfg(feature = "fixtures")))]
pub mod fixtures;

pub use must::*;

#[doc(hidden)]
pub use cockpit_telemetry_core as __core;
