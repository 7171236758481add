//! Events produced by frame decoders.

use crate::field::{FieldPath, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A field whose decoded value differs from its previously cached value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub path: FieldPath,
    pub value: FieldValue,
}

impl ChangeEvent {
    pub fn new(path: impl Into<FieldPath>, value: impl Into<FieldValue>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

impl PartialEq for ChangeEvent {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.value.same_as(&other.value)
    }
}

/// Active vehicle type reported by the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleIdentity {
    /// Identifier exactly as received (NUL-trimmed).
    pub raw: String,
    /// Canonical name used to select vehicle-specific behaviour.
    pub normalized: String,
}

impl VehicleIdentity {
    pub fn new(raw: impl Into<String>, normalized: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            normalized: normalized.into(),
        }
    }

    /// Identity that carries no normalization.
    pub fn verbatim(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            normalized: raw.clone(),
            raw,
        }
    }
}

impl fmt::Display for VehicleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Output of one `ChangeSource::feed` call, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// Ordinary field change, routed through dispatch.
    Field(ChangeEvent),
    /// Vehicle identity changed; never dispatched to field observers.
    IdentityChanged(VehicleIdentity),
}

impl DecodeEvent {
    pub fn as_change(&self) -> Option<&ChangeEvent> {
        match self {
            DecodeEvent::Field(change) => Some(change),
            DecodeEvent::IdentityChanged(_) => None,
        }
    }

    pub fn as_identity(&self) -> Option<&VehicleIdentity> {
        match self {
            DecodeEvent::IdentityChanged(identity) => Some(identity),
            DecodeEvent::Field(_) => None,
        }
    }
}

impl From<ChangeEvent> for DecodeEvent {
    fn from(change: ChangeEvent) -> Self {
        DecodeEvent::Field(change)
    }
}
