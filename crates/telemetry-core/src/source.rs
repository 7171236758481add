//! The contract shared by every frame decoder.

use crate::cache::FieldSnapshot;
use crate::event::{DecodeEvent, VehicleIdentity};
use crate::field::{FieldPath, FieldValue};
use opencockpit_errors::DecodeError;
use serde::{Deserialize, Serialize};

/// Counters maintained by a decoder over its lifetime (cleared by `reset`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderStats {
    /// Units of input accepted by `feed`.
    pub units: u64,
    /// Units dropped with a `DecodeError`.
    pub decode_errors: u64,
    /// Field change events emitted.
    pub events: u64,
    pub identity_changes: u64,
    /// Metadata blocks abandoned because they exceeded the size cap.
    pub metadata_overflows: u64,
}

/// Turns raw payloads into change events while owning the last-value cache.
///
/// `feed` either returns every event the payload produced, in payload order,
/// or a `DecodeError` meaning the unit was dropped and no cached state was
/// modified.
pub trait ChangeSource: Send {
    /// Short protocol label used in logs.
    fn protocol(&self) -> &'static str;

    fn feed(&mut self, bytes: &[u8]) -> Result<Vec<DecodeEvent>, DecodeError>;

    /// Fields visible to per-tick polling (see `FieldSnapshot`).
    fn snapshot(&self) -> &FieldSnapshot;

    fn cached(&self, path: &FieldPath) -> Option<&FieldValue>;

    fn identity(&self) -> Option<&VehicleIdentity>;

    fn stats(&self) -> DecoderStats;

    /// Drop buffered bytes, cached values and identity (reconnect).
    fn reset(&mut self);
}

impl<T: ChangeSource + ?Sized> ChangeSource for Box<T> {
    fn protocol(&self) -> &'static str {
        (**self).protocol()
    }

    fn feed(&mut self, bytes: &[u8]) -> Result<Vec<DecodeEvent>, DecodeError> {
        (**self).feed(bytes)
    }

    fn snapshot(&self) -> &FieldSnapshot {
        (**self).snapshot()
    }

    fn cached(&self, path: &FieldPath) -> Option<&FieldValue> {
        (**self).cached(path)
    }

    fn identity(&self) -> Option<&VehicleIdentity> {
        (**self).identity()
    }

    fn stats(&self) -> DecoderStats {
        (**self).stats()
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}
