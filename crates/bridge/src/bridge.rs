//! The bridge loop: one decoder, the haptic engine and the mapping table
//! driven from a datagram source at the active or idle cadence.

use crate::clock::TokioClock;
use crate::config::BridgeConfig;
use crate::source::DatagramSource;
use cockpit_telemetry_core::{
    ChangeSource, Clock, LinkState, LinkTracker, LinkTransition, MotorChannel, OutputSink,
};
use opencockpit_dispatch::TelemetryPipeline;
use opencockpit_errors::ConfigError;
use opencockpit_haptics::{HapticEngine, SharedEngine, attach};
use opencockpit_mappings::{InstalledMappings, MappingTable};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Status line period while data is flowing.
pub const STATUS_INTERVAL_ACTIVE: Duration = Duration::from_secs(5);
/// Status line period while idle.
pub const STATUS_INTERVAL_IDLE: Duration = Duration::from_secs(30);

/// Snapshot of the bridge counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeStatus {
    pub link: LinkState,
    /// Normalized name of the current vehicle.
    pub vehicle: Option<String>,
    /// Datagrams received since start, across reconnects.
    pub datagrams: u64,
    pub decode_errors: u64,
    /// Arbitration passes run.
    pub ticks: u64,
    pub links_established: u64,
    /// Mapping rules currently subscribed.
    pub mappings_installed: usize,
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = if self.link.is_active() {
            "RECEIVING DATA"
        } else {
            "NO DATA"
        };
        write!(
            f,
            "{link} | vehicle: {} | datagrams: {} | decode errors: {}",
            self.vehicle.as_deref().unwrap_or("N/A"),
            self.datagrams,
            self.decode_errors
        )
    }
}

/// Owns every piece of the telemetry path for one output sink.
///
/// [`Bridge::step`] is the whole per-iteration behaviour and is synchronous;
/// [`Bridge::run`] only adds waiting.
pub struct Bridge {
    config: BridgeConfig,
    clock: Arc<dyn Clock>,
    pipeline: TelemetryPipeline<Box<dyn ChangeSource>>,
    engine: SharedEngine,
    sink: Arc<dyn OutputSink>,
    mappings: Option<MappingTable>,
    installed: Option<InstalledMappings>,
    link: LinkTracker,
    datagrams: u64,
    decode_errors: u64,
    last_status_log: Option<Instant>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("protocol", &self.pipeline.protocol())
            .field("link", &self.link.state())
            .field("mappings", &self.installed.as_ref().map(InstalledMappings::len))
            .field("datagrams", &self.datagrams)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Build a bridge timed by the tokio clock. Loads the mapping table named
    /// in `config`, if any.
    pub fn new(config: BridgeConfig, sink: Arc<dyn OutputSink>) -> Result<Self, ConfigError> {
        Self::with_clock(config, sink, Arc::new(TokioClock))
    }

    pub fn with_clock(
        config: BridgeConfig,
        sink: Arc<dyn OutputSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mappings = config
            .mappings
            .as_ref()
            .map(MappingTable::load)
            .transpose()?;

        let engine = HapticEngine::with_clock(config.haptics.clone(), Arc::clone(&clock)).shared();
        let mut pipeline = TelemetryPipeline::with_clock(config.protocol.decoder(), Arc::clone(&clock));
        let haptic_inputs = attach(&engine, pipeline.dispatcher_mut());
        debug!(inputs = haptic_inputs.len(), "Haptic engine attached");

        let mut bridge = Self {
            link: LinkTracker::new(config.link()),
            config,
            clock,
            pipeline,
            engine,
            sink,
            mappings,
            installed: None,
            datagrams: 0,
            decode_errors: 0,
            last_status_log: None,
        };
        bridge.select_mappings();
        Ok(bridge)
    }

    /// Replace the mapping table. The old table's outputs are switched off.
    pub fn with_mappings(mut self, table: MappingTable) -> Self {
        if let Some(installed) = self.installed.take() {
            installed.uninstall(self.pipeline.dispatcher_mut());
        }
        if let Some(old) = &self.mappings {
            old.quiesce(self.sink.as_ref());
        }
        self.mappings = Some(table);
        self.select_mappings();
        self
    }

    /// Install the mapping table when it applies to the current vehicle and
    /// remove it when it stops applying.
    fn select_mappings(&mut self) {
        let Some(table) = &self.mappings else {
            return;
        };
        let wanted = match (&table.vehicle, self.pipeline.identity()) {
            (None, _) => true,
            (Some(_), Some(identity)) => table.applies_to(identity),
            (Some(_), None) => false,
        };
        match (wanted, self.installed.take()) {
            (true, None) => {
                let installed = table.install(self.pipeline.dispatcher_mut(), Arc::clone(&self.sink));
                info!(
                    rules = installed.len(),
                    vehicle = table.vehicle.as_deref().unwrap_or("any"),
                    "Mappings installed"
                );
                self.installed = Some(installed);
                let replayed = self.pipeline.apply_current_state();
                debug!(replayed, "Current state applied to new mappings");
            }
            (false, Some(installed)) => {
                let removed = installed.uninstall(self.pipeline.dispatcher_mut());
                table.quiesce(self.sink.as_ref());
                match self.pipeline.identity() {
                    Some(identity) => warn!(
                        vehicle = %identity,
                        expected = table.vehicle.as_deref().unwrap_or("any"),
                        removed,
                        "No mappings for this vehicle"
                    ),
                    None => debug!(removed, "Mappings removed until a vehicle is known"),
                }
            }
            (_, installed) => self.installed = installed,
        }
    }

    /// One loop iteration.
    ///
    /// Ingests `datagram` if there is one, updates link freshness, and runs
    /// one arbitration pass while the link is active. Losing the link resets
    /// the decoder and the engine and switches every output off.
    pub fn step(&mut self, datagram: Option<&[u8]>) -> LinkState {
        let now = self.clock.now();

        if let Some(bytes) = datagram {
            self.datagrams = self.datagrams.saturating_add(1);
            match self.pipeline.ingest(bytes) {
                Ok(report) => {
                    self.decode_errors = self.decode_errors.saturating_add(report.dropped);
                    if let Some(LinkTransition::Established) = self.link.record_datagram(now) {
                        info!(
                            protocol = self.pipeline.protocol(),
                            established = self.link.established_count(),
                            "Telemetry link established"
                        );
                    }
                    if report.identity.is_some() {
                        self.select_mappings();
                    }
                }
                Err(_) => self.decode_errors = self.decode_errors.saturating_add(1),
            }
        }

        if let Some(LinkTransition::Lost) = self.link.check(now) {
            self.on_link_lost();
        }

        if self.link.is_active() {
            self.engine
                .lock()
                .tick(self.pipeline.snapshot(), self.sink.as_ref());
        }

        self.maybe_log_status(now);
        self.link.state()
    }

    fn on_link_lost(&mut self) {
        info!(
            window_ms = self.config.freshness_window_ms,
            datagrams = self.pipeline.stats().datagrams,
            "Telemetry link lost; outputs off"
        );
        self.engine.lock().reset();
        self.pipeline.reset();
        self.select_mappings();
        if let Some(installed) = &self.installed {
            installed.invalidate();
        }
        self.quiesce();
    }

    fn maybe_log_status(&mut self, now: Instant) {
        let interval = if self.link.is_active() {
            STATUS_INTERVAL_ACTIVE
        } else {
            STATUS_INTERVAL_IDLE
        };
        let due = self
            .last_status_log
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if due {
            info!(status = %self.status(), "Bridge status");
            self.last_status_log = Some(now);
        }
    }

    /// Re-apply the current state to every observer after an output device
    /// reconnects. Returns the number of observer invocations.
    pub fn hot_plug(&mut self) -> usize {
        if let Some(installed) = &self.installed {
            installed.invalidate();
        }
        let replayed = self.pipeline.apply_current_state();
        info!(replayed, "Current state re-applied to outputs");
        replayed
    }

    /// Switch every motor and mapped indicator off.
    pub fn quiesce(&self) {
        for channel in MotorChannel::ALL {
            self.sink.set_motor(channel, 0);
        }
        if let Some(table) = &self.mappings {
            table.quiesce(self.sink.as_ref());
        }
    }

    /// Drive `source` until `stop` turns `true`, its sender is dropped, or
    /// the source closes. Outputs start and end dark.
    ///
    /// Each iteration waits up to `recv_timeout` for one datagram, calls
    /// [`Bridge::step`], then sleeps for the active or idle tick. Both waits
    /// race the stop signal.
    pub async fn run<D>(&mut self, source: &mut D, mut stop: watch::Receiver<bool>) -> BridgeStatus
    where
        D: DatagramSource + ?Sized,
    {
        info!(
            source = %source.describe(),
            protocol = self.pipeline.protocol(),
            "Bridge running"
        );
        self.quiesce();
        let recv_timeout = self.config.recv_timeout();

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            let received = tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                received = tokio::time::timeout(recv_timeout, source.recv()) => received,
            };
            let datagram = match received {
                Ok(Ok(Some(bytes))) => Some(bytes),
                Ok(Ok(None)) => {
                    info!("Datagram source closed");
                    break;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Datagram receive failed");
                    None
                }
                Err(_elapsed) => None,
            };

            let pause = if self.step(datagram.as_deref()).is_active() {
                self.config.active_tick()
            } else {
                self.config.idle_tick()
            };
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                () = tokio::time::sleep(pause) => {}
            }
        }

        self.quiesce();
        let status = self.status();
        info!(%status, "Bridge stopped");
        status
    }

    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            link: self.link.state(),
            vehicle: self
                .pipeline
                .identity()
                .map(|identity| identity.normalized.clone()),
            datagrams: self.datagrams,
            decode_errors: self.decode_errors,
            ticks: self.engine.lock().ticks(),
            links_established: self.link.established_count(),
            mappings_installed: self.installed.as_ref().map_or(0, InstalledMappings::len),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn pipeline(&self) -> &TelemetryPipeline<Box<dyn ChangeSource>> {
        &self.pipeline
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }
}
