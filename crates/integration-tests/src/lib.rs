//! End-to-end test support for OpenCockpit
//!
//! Scenarios drive a complete [`cockpit_bridge::Bridge`] with scripted
//! datagrams and scripted time:
//! - `harness` - Bridge wired to a manual clock and a recording sink
//! - `flight` - Structured export documents for a simple flight profile

#![deny(rust_2018_idioms)]
#![deny(warnings)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::print_stdout)]

pub mod flight;
pub mod harness;

pub use flight::FlightState;
pub use harness::CockpitHarness;

/// Install a test-writer tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `debug` for the workspace crates.
pub fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,cockpit_bridge=debug,opencockpit_mappings=debug,opencockpit_haptics=debug")
    });
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("Test tracing initialised");
    }
}
