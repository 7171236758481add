//! UDP telemetry bridge for OpenCockpit
//!
//! Receives simulator datagrams, decodes them with the configured protocol,
//! dispatches field changes to the mapping table and the haptic engine, and
//! runs the arbitration tick at 100 Hz while data flows and 1 Hz while idle.
//!
//! ## Modules
//! - `config` - `BridgeConfig` YAML file with protocol-dependent endpoints
//! - `source` - `DatagramSource` with UDP and in-memory channel variants
//! - `bridge` - The synchronous `step` and the async `run` loop
//! - `clock` - Tokio-backed clock so paused test time drives the loop
//! - `observability` - Tracing subscriber setup

#![deny(static_mut_refs)]

pub mod bridge;
pub mod clock;
pub mod config;
pub mod observability;
pub mod source;

pub use bridge::{Bridge, BridgeStatus, STATUS_INTERVAL_ACTIVE, STATUS_INTERVAL_IDLE};
pub use clock::TokioClock;
pub use config::BridgeConfig;
pub use observability::{DEFAULT_FILTER, init_tracing};
pub use source::{ChannelDatagramSource, DatagramSource, MAX_DATAGRAM_SIZE, UdpDatagramSource};

use anyhow::{Context, Result};
use cockpit_telemetry_core::OutputSink;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Stop signal for [`Bridge::run`]: send `true` to stop.
pub fn stop_signal() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Send `true` on `stop` once Ctrl+C is received.
pub async fn stop_on_ctrl_c(stop: watch::Sender<bool>) -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Shutdown requested");
    if stop.send(true).is_err() {
        debug!("Bridge already stopped");
    }
    Ok(())
}

/// Bind the configured socket and run a bridge until `stop`.
pub async fn serve(
    config: BridgeConfig,
    sink: Arc<dyn OutputSink>,
    stop: watch::Receiver<bool>,
) -> Result<BridgeStatus> {
    let mut source = UdpDatagramSource::bind(&config).await?;
    let mut bridge = Bridge::new(config, sink).context("Invalid bridge configuration")?;
    Ok(bridge.run(&mut source, stop).await)
}

/// [`serve`] with the configuration read from `path`.
pub async fn serve_config_file(
    path: impl AsRef<Path>,
    sink: Arc<dyn OutputSink>,
    stop: watch::Receiver<bool>,
) -> Result<BridgeStatus> {
    let path = path.as_ref();
    let config = BridgeConfig::load(path)
        .with_context(|| format!("Failed to load bridge config {}", path.display()))?;
    serve(config, sink, stop).await
}
