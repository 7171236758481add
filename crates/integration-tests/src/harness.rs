//! A bridge on scripted time.

use anyhow::{Context, Result};
use cockpit_bridge::{Bridge, BridgeConfig};
use cockpit_telemetry_core::{IndicatorId, LinkState, ManualClock, MotorChannel};
use opencockpit_mappings::MappingTable;
use opencockpit_test_helpers::mock::RecordingSink;
use std::sync::Arc;

/// [`Bridge`] whose clock only moves when the scenario says so.
///
/// Each `send`/`advance` call is exactly one loop iteration, so every call
/// while the link is active produces one arbitration pass.
pub struct CockpitHarness {
    bridge: Bridge,
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink>,
}

impl CockpitHarness {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let clock = Arc::new(ManualClock::new());
        let sink = RecordingSink::shared();
        let bridge = Bridge::with_clock(config, sink.clone(), clock.clone())
            .context("Failed to build bridge")?;
        Ok(Self {
            bridge,
            clock,
            sink,
        })
    }

    /// Build a harness with a mapping table parsed from YAML.
    pub fn with_table(config: BridgeConfig, yaml: &str) -> Result<Self> {
        let table = MappingTable::from_yaml_str(yaml, "scenario table")?;
        let mut harness = Self::new(config)?;
        harness.bridge = harness.bridge.with_mappings(table);
        Ok(harness)
    }

    /// One iteration with a datagram.
    pub fn send(&mut self, datagram: &[u8]) -> LinkState {
        self.bridge.step(Some(datagram))
    }

    /// Let `ms` pass, then run one iteration with a datagram.
    pub fn send_after(&mut self, ms: u64, datagram: &[u8]) -> LinkState {
        self.clock.advance_ms(ms);
        self.send(datagram)
    }

    /// Let `ms` pass, then run one iteration without a datagram.
    pub fn advance(&mut self, ms: u64) -> LinkState {
        self.clock.advance_ms(ms);
        self.bridge.step(None)
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    pub fn motors(&self) -> (Option<u8>, Option<u8>) {
        (
            self.sink.last_motor(MotorChannel::A),
            self.sink.last_motor(MotorChannel::B),
        )
    }

    pub fn lamp(&self, id: &IndicatorId) -> Option<bool> {
        self.sink.last_discrete(id)
    }
}
