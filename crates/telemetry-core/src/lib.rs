//! Core telemetry types shared by the decoders, dispatch core and haptics engine.
//!
//! ## Modules
//! - `field` - Field paths, scalar values and bit-field extraction
//! - `event` - Change events, identity events and vehicle identity
//! - `cache` - Last-value cache and per-unit field snapshots
//! - `source` - The `ChangeSource` contract implemented by every frame decoder
//! - `clock` - Injectable time source (`MonotonicClock`, `ManualClock`)
//! - `sink` - The `OutputSink` capability consumed by mappings and haptics
//! - `link` - Datagram freshness tracking (active/idle transitions)

#![deny(static_mut_refs)]

pub mod cache;
pub mod clock;
pub mod event;
pub mod field;
pub mod link;
pub mod sink;
pub mod source;

pub use cache::{FieldCache, FieldSnapshot};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use event::{ChangeEvent, DecodeEvent, VehicleIdentity};
pub use field::{BitField, FieldPath, FieldValue};
pub use link::{DEFAULT_FRESHNESS_WINDOW_MS, LinkConfig, LinkState, LinkTracker, LinkTransition};
pub use sink::{IndicatorId, MotorChannel, NullSink, OutputSink};
pub use source::{ChangeSource, DecoderStats};

pub use opencockpit_errors::DecodeError;
