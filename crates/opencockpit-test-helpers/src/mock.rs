//! Mock implementations for testing.
//!
//! [`RecordingSink`] captures every output command; the observers record
//! what the dispatch core delivered to them.

use cockpit_telemetry_core::{FieldValue, IndicatorId, MotorChannel, OutputSink};
use opencockpit_dispatch::Observer;
use opencockpit_errors::{ObserverError, ObserverResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One command issued to an [`OutputSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCommand {
    Discrete { id: IndicatorId, on: bool },
    Level { id: IndicatorId, level: u8 },
    Motor { channel: MotorChannel, intensity: u8 },
}

/// Output sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<SinkCommand>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn commands(&self) -> Vec<SinkCommand> {
        self.commands.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    /// Intensities written to `channel`, oldest first.
    pub fn motor_history(&self, channel: MotorChannel) -> Vec<u8> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                SinkCommand::Motor {
                    channel: ch,
                    intensity,
                } if *ch == channel => Some(*intensity),
                _ => None,
            })
            .collect()
    }

    pub fn last_motor(&self, channel: MotorChannel) -> Option<u8> {
        self.motor_history(channel).last().copied()
    }

    pub fn discrete_history(&self, id: &IndicatorId) -> Vec<bool> {
        self.commands
            .lock()
            .iter()
            .filter_map(|c| match c {
                SinkCommand::Discrete { id: target, on } if target == id => Some(*on),
                _ => None,
            })
            .collect()
    }

    pub fn last_discrete(&self, id: &IndicatorId) -> Option<bool> {
        self.discrete_history(id).last().copied()
    }

    pub fn last_level(&self, id: &IndicatorId) -> Option<u8> {
        self.commands.lock().iter().rev().find_map(|c| match c {
            SinkCommand::Level { id: target, level } if target == id => Some(*level),
            _ => None,
        })
    }
}

impl OutputSink for RecordingSink {
    fn set_discrete(&self, id: &IndicatorId, on: bool) {
        self.commands.lock().push(SinkCommand::Discrete {
            id: id.clone(),
            on,
        });
    }

    fn set_level(&self, id: &IndicatorId, level: u8) {
        self.commands.lock().push(SinkCommand::Level {
            id: id.clone(),
            level,
        });
    }

    fn set_motor(&self, channel: MotorChannel, intensity: u8) {
        self.commands
            .lock()
            .push(SinkCommand::Motor { channel, intensity });
    }
}

/// Values delivered to a [`RecordingObserver`].
#[derive(Debug, Clone, Default)]
pub struct Received(Arc<Mutex<Vec<FieldValue>>>);

impl Received {
    pub fn values(&self) -> Vec<FieldValue> {
        self.0.lock().clone()
    }

    pub fn ints(&self) -> Vec<i64> {
        self.0.lock().iter().filter_map(FieldValue::as_i64).collect()
    }

    pub fn bools(&self) -> Vec<bool> {
        self.0.lock().iter().map(FieldValue::as_bool).collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Observer that records every value it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    received: Received,
}

impl RecordingObserver {
    /// Returns the observer and a handle for reading what it received.
    pub fn new() -> (Self, Received) {
        let received = Received::default();
        (
            Self {
                received: received.clone(),
            },
            received,
        )
    }
}

impl Observer for RecordingObserver {
    fn receive(&mut self, value: &FieldValue) -> ObserverResult {
        self.received.0.lock().push(value.clone());
        Ok(())
    }
}

/// Observer that always fails, counting its invocations.
#[derive(Debug)]
pub struct FailingObserver {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingObserver {
    pub fn new(message: impl Into<String>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                message: message.into(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Observer for FailingObserver {
    fn receive(&mut self, _value: &FieldValue) -> ObserverResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ObserverError::failed(self.message.clone()))
    }
}

/// Shared, ordered log of labelled observer invocations.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer appending `"{label}={value}"` to this log.
    pub fn observer(&self, label: &str) -> impl Observer + 'static {
        let log = self.clone();
        let label = label.to_string();
        move |value: &FieldValue| -> ObserverResult {
            log.0.lock().push(format!("{label}={value}"));
            Ok(())
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}
