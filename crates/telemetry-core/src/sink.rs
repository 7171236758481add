//! Output sink capability.
//!
//! The sink stands in for indicator boards and vibration motor drivers.
//! Implementations own discovery, reconnection and raw writes; every call
//! must be safe while the device is unplugged, so none of them can fail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One indicator (LED or backlight channel) on one output device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndicatorId {
    pub device: String,
    pub index: u8,
}

impl IndicatorId {
    pub fn new(device: impl Into<String>, index: u8) -> Self {
        Self {
            device: device.into(),
            index,
        }
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.device, self.index)
    }
}

/// Physical vibration output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorChannel {
    /// Seat / pedal transducer.
    A,
    /// Joystick transducer.
    B,
}

impl MotorChannel {
    pub const ALL: [MotorChannel; 2] = [MotorChannel::A, MotorChannel::B];
}

impl fmt::Display for MotorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorChannel::A => f.write_str("A"),
            MotorChannel::B => f.write_str("B"),
        }
    }
}

/// Idempotent output commands.
pub trait OutputSink: Send + Sync {
    fn set_discrete(&self, id: &IndicatorId, on: bool);

    fn set_level(&self, id: &IndicatorId, level: u8);

    fn set_motor(&self, channel: MotorChannel, intensity: u8);
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn set_discrete(&self, id: &IndicatorId, on: bool) {
        (**self).set_discrete(id, on);
    }

    fn set_level(&self, id: &IndicatorId, level: u8) {
        (**self).set_level(id, level);
    }

    fn set_motor(&self, channel: MotorChannel, intensity: u8) {
        (**self).set_motor(channel, intensity);
    }
}

/// Sink with nothing attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn set_discrete(&self, _id: &IndicatorId, _on: bool) {}

    fn set_level(&self, _id: &IndicatorId, _level: u8) {}

    fn set_motor(&self, _channel: MotorChannel, _intensity: u8) {}
}
