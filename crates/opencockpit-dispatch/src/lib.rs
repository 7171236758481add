//! Change dispatch core for OpenCockpit.
//!
//! The [`Dispatcher`] keeps the last value seen for every field path and
//! routes changed values to the observers registered for that path, in
//! registration order. [`TelemetryPipeline`] couples one frame decoder with
//! one dispatcher and is what the bridge loop drives once per datagram.
//!
//! ```rust
//! use cockpit_telemetry_core::{ChangeEvent, FieldPath, FieldValue};
//! use opencockpit_dispatch::Dispatcher;
//! use opencockpit_errors::ObserverResult;
//!
//! let mut dispatcher = Dispatcher::new();
//! let path = FieldPath::named("leds.MASTER_CAUTION");
//! dispatcher.subscribe(path.clone(), |value: &FieldValue| -> ObserverResult {
//!     println!("caution -> {}", value.as_bool());
//!     Ok(())
//! });
//!
//! assert_eq!(dispatcher.notify(&ChangeEvent::new(path.clone(), 1)), 1);
//! // Unchanged values are suppressed.
//! assert_eq!(dispatcher.notify(&ChangeEvent::new(path, 1)), 0);
//! ```

pub mod dispatcher;
pub mod error_sink;
pub mod observer;
pub mod pipeline;

pub use dispatcher::{DispatchStats, Dispatcher};
pub use error_sink::{ErrorSink, LogErrorSink, ObserverFailure};
pub use observer::{Observer, SubscriptionId, Unsubscriber};
pub use pipeline::{IngestReport, PipelineStats, TelemetryPipeline};
