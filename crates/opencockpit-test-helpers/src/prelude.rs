//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use opencockpit_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_parse, must_some, must_with};
pub use crate::{assert_approx_eq, assert_non_decreasing};

#[cfg(feature = "mock")]
pub use crate::assert_motors;

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{DcsBiosStream, ExportDocument};

#[cfg(feature = "mock")]
pub use crate::mock::{
    CallLog, FailingObserver, Received, RecordingObserver, RecordingSink, SinkCommand,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
