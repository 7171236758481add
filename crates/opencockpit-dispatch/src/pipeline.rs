//! One decoder feeding one dispatcher.

use crate::dispatcher::Dispatcher;
use cockpit_telemetry_core::{
    ChangeSource, Clock, DecodeError, DecodeEvent, FieldPath, FieldSnapshot, FieldValue,
    MonotonicClock, VehicleIdentity,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Decode errors logged at `warn!`; later ones go to `debug!`.
pub const LOGGED_DECODE_ERRORS: u64 = 10;

type IdentityObserver = Box<dyn FnMut(&VehicleIdentity) + Send>;

/// Counters across the lifetime of a pipeline (cleared by `reset`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Datagrams handed to `ingest`, decodable or not.
    pub datagrams: u64,
    pub decode_errors: u64,
    pub change_events: u64,
    pub identity_changes: u64,
    pub observer_failures: u64,
    /// When the last successfully decoded datagram arrived.
    pub last_datagram_at: Option<Instant>,
}

/// What a single `ingest` call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Change events emitted by the decoder.
    pub changes: usize,
    /// Observer invocations those changes caused.
    pub invocations: usize,
    pub identity: Option<VehicleIdentity>,
    /// Buffered records the decoder discarded while resynchronising.
    pub dropped: u64,
}

/// Owns a [`ChangeSource`] and the [`Dispatcher`] its events go through.
///
/// Events from one datagram are dispatched synchronously and in payload
/// order before `ingest` returns.
pub struct TelemetryPipeline<S: ChangeSource> {
    source: S,
    dispatcher: Dispatcher,
    identity_observers: Vec<IdentityObserver>,
    clock: Arc<dyn Clock>,
    stats: PipelineStats,
}

impl<S: ChangeSource> fmt::Debug for TelemetryPipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryPipeline")
            .field("protocol", &self.source.protocol())
            .field("dispatcher", &self.dispatcher)
            .field("identity_observers", &self.identity_observers.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: ChangeSource> TelemetryPipeline<S> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, Arc::new(MonotonicClock))
    }

    pub fn with_clock(source: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            dispatcher: Dispatcher::new(),
            identity_observers: Vec::new(),
            clock,
            stats: PipelineStats::default(),
        }
    }

    /// Replace the dispatcher, keeping its subscriptions.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Call `observer` whenever the decoder reports a new vehicle identity.
    pub fn on_identity(&mut self, observer: impl FnMut(&VehicleIdentity) + Send + 'static) {
        self.identity_observers.push(Box::new(observer));
    }

    /// Decode one datagram and dispatch everything it produced.
    ///
    /// A `DecodeError` means the datagram was dropped: it is counted and
    /// logged, and neither the decoder cache nor the dispatcher changed.
    /// Buffered records the decoder abandons while resynchronising are counted
    /// as decode errors too, without failing the datagram that revealed them.
    pub fn ingest(&mut self, bytes: &[u8]) -> Result<IngestReport, DecodeError> {
        self.stats.datagrams = self.stats.datagrams.saturating_add(1);
        let decoder_errors = self.source.stats().decode_errors;

        let events = match self.source.feed(bytes) {
            Ok(events) => events,
            Err(error) => {
                self.stats.decode_errors = self.stats.decode_errors.saturating_add(1);
                if self.stats.decode_errors <= LOGGED_DECODE_ERRORS {
                    warn!(
                        protocol = self.source.protocol(),
                        count = self.stats.decode_errors,
                        len = bytes.len(),
                        error = %error,
                        "Dropped undecodable datagram"
                    );
                } else {
                    debug!(
                        protocol = self.source.protocol(),
                        count = self.stats.decode_errors,
                        error = %error,
                        "Dropped undecodable datagram"
                    );
                }
                return Err(error);
            }
        };

        self.stats.last_datagram_at = Some(self.clock.now());
        let failures_before = self.dispatcher.stats().failures;
        let mut report = IngestReport {
            dropped: self
                .source
                .stats()
                .decode_errors
                .saturating_sub(decoder_errors),
            ..IngestReport::default()
        };
        self.stats.decode_errors = self.stats.decode_errors.saturating_add(report.dropped);

        for event in events {
            match event {
                DecodeEvent::Field(change) => {
                    report.changes = report.changes.saturating_add(1);
                    report.invocations = report
                        .invocations
                        .saturating_add(self.dispatcher.notify(&change));
                }
                DecodeEvent::IdentityChanged(identity) => {
                    info!(
                        protocol = self.source.protocol(),
                        raw = %identity.raw,
                        vehicle = %identity.normalized,
                        "Vehicle identity changed"
                    );
                    for observer in &mut self.identity_observers {
                        observer(&identity);
                    }
                    self.stats.identity_changes = self.stats.identity_changes.saturating_add(1);
                    report.identity = Some(identity);
                }
            }
        }

        self.stats.change_events = self
            .stats
            .change_events
            .saturating_add(report.changes as u64);
        let failures = self
            .dispatcher
            .stats()
            .failures
            .saturating_sub(failures_before);
        self.stats.observer_failures = self.stats.observer_failures.saturating_add(failures);

        Ok(report)
    }

    /// Re-deliver cached values to every observer (hot-plug).
    pub fn apply_current_state(&mut self) -> usize {
        self.dispatcher.apply_current_state()
    }

    /// Clear decoder buffers, cached values, identity and counters
    /// (reconnect). Subscriptions survive.
    pub fn reset(&mut self) {
        debug!(protocol = self.source.protocol(), "Resetting telemetry pipeline");
        self.source.reset();
        self.dispatcher.clear_cache();
        self.stats = PipelineStats::default();
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> &FieldSnapshot {
        self.source.snapshot()
    }

    pub fn get_cached(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.dispatcher.get_cached(path)
    }

    pub fn identity(&self) -> Option<&VehicleIdentity> {
        self.source.identity()
    }

    pub fn protocol(&self) -> &'static str {
        self.source.protocol()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_telemetry_core::{ChangeEvent, DecoderStats, FieldCache, ManualClock};
    use opencockpit_errors::ObserverResult;
    use parking_lot::Mutex;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// `path=int` per line; `!name` announces an identity; `?` is malformed.
    #[derive(Debug, Default)]
    struct LineSource {
        cache: FieldCache,
        identity: Option<VehicleIdentity>,
        stats: DecoderStats,
    }

    impl ChangeSource for LineSource {
        fn protocol(&self) -> &'static str {
            "lines"
        }

        fn feed(&mut self, bytes: &[u8]) -> Result<Vec<DecodeEvent>, DecodeError> {
            let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::NotUtf8(e.to_string()))?;
            if text.contains('?') {
                return Err(DecodeError::NotADocument);
            }
            let mut events = Vec::new();
            for line in text.lines() {
                if let Some(name) = line.strip_prefix('!') {
                    let identity = VehicleIdentity::verbatim(name);
                    self.identity = Some(identity.clone());
                    events.push(DecodeEvent::IdentityChanged(identity));
                } else if let Some((path, value)) = line.split_once('=') {
                    let path = FieldPath::named(path);
                    let value = FieldValue::Int(value.parse().unwrap_or_default());
                    if self.cache.update(&path, &value) {
                        events.push(ChangeEvent::new(path, value).into());
                    }
                }
            }
            self.stats.units += 1;
            Ok(events)
        }

        fn snapshot(&self) -> &FieldSnapshot {
            self.cache.as_snapshot()
        }

        fn cached(&self, path: &FieldPath) -> Option<&FieldValue> {
            self.cache.get(path)
        }

        fn identity(&self) -> Option<&VehicleIdentity> {
            self.identity.as_ref()
        }

        fn stats(&self) -> DecoderStats {
            self.stats
        }

        fn reset(&mut self) {
            *self = Self::default();
        }
    }

    #[test]
    fn test_ingest_dispatches_in_payload_order() -> TestResult {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = TelemetryPipeline::new(LineSource::default());
        for path in ["a.x", "a.y"] {
            let order = Arc::clone(&order);
            pipeline
                .dispatcher_mut()
                .subscribe(path, move |value: &FieldValue| -> ObserverResult {
                    order.lock().push(format!("{path}={value}"));
                    Ok(())
                });
        }

        let report = pipeline.ingest(b"a.y=2\na.x=1\na.z=9")?;

        assert_eq!(report.changes, 3);
        assert_eq!(report.invocations, 2);
        assert_eq!(order.lock().as_slice(), &["a.y=2", "a.x=1"]);
        assert_eq!(pipeline.get_cached(&FieldPath::named("a.z")), Some(&FieldValue::Int(9)));
        Ok(())
    }

    #[test]
    fn test_decode_errors_are_counted_and_dropped() -> TestResult {
        let clock = Arc::new(ManualClock::new());
        let mut pipeline = TelemetryPipeline::with_clock(LineSource::default(), clock.clone());
        pipeline.ingest(b"a.x=1")?;
        let first_seen = pipeline.stats().last_datagram_at;
        clock.advance_ms(500);

        for _ in 0..12 {
            let dropped = pipeline.ingest(b"a.x=5?");
            assert_eq!(dropped, Err(DecodeError::NotADocument));
        }

        let stats = pipeline.stats();
        assert_eq!(stats.datagrams, 13);
        assert_eq!(stats.decode_errors, 12);
        assert_eq!(stats.last_datagram_at, first_seen);
        assert_eq!(pipeline.get_cached(&FieldPath::named("a.x")), Some(&FieldValue::Int(1)));
        Ok(())
    }

    #[test]
    fn test_identity_observers_and_reset() -> TestResult {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut pipeline = TelemetryPipeline::new(LineSource::default());
        pipeline.on_identity(move |identity| sink.lock().push(identity.to_string()));

        let report = pipeline.ingest(b"!F-16C_50\na.x=1")?;
        assert_eq!(report.identity, Some(VehicleIdentity::verbatim("F-16C_50")));
        assert_eq!(seen.lock().as_slice(), &["F-16C_50"]);
        assert_eq!(pipeline.stats().identity_changes, 1);

        pipeline.reset();
        assert!(pipeline.identity().is_none());
        assert!(pipeline.get_cached(&FieldPath::named("a.x")).is_none());
        assert_eq!(pipeline.stats(), PipelineStats::default());

        // After reset the same value is a change again.
        assert_eq!(pipeline.ingest(b"a.x=1")?.changes, 1);
        Ok(())
    }

    #[test]
    fn test_observer_failures_are_counted() -> TestResult {
        let mut pipeline = TelemetryPipeline::new(LineSource::default());
        pipeline
            .dispatcher_mut()
            .subscribe("a.x", |_value: &FieldValue| -> ObserverResult {
                Err(opencockpit_errors::ObserverError::failed("unplugged"))
            });
        pipeline.ingest(b"a.x=1")?;
        pipeline.ingest(b"a.x=2")?;
        assert_eq!(pipeline.stats().observer_failures, 2);
        Ok(())
    }
}
