//! Data-driven indicator mappings for OpenCockpit
//!
//! A [`MappingRule`] binds one field path (optionally a bit-field of a 16-bit
//! register) to one indicator through a [`Transform`]. Rule tables are data:
//! they are loaded from YAML with [`MappingTable::load`] and installed on a
//! dispatcher as ordinary observers.
//!
//! ```
//! use cockpit_telemetry_core::{ChangeEvent, NullSink};
//! use opencockpit_dispatch::Dispatcher;
//! use opencockpit_mappings::MappingTable;
//! use std::sync::Arc;
//!
//! let table = MappingTable::from_yaml_str(
//!     r#"
//! rules:
//!   - path: leds.MASTER_CAUTION
//!     action: { discrete: { device: ufc, index: 7 } }
//! "#,
//!     "inline",
//! )?;
//!
//! let mut dispatcher = Dispatcher::new();
//! let installed = table.install(&mut dispatcher, Arc::new(NullSink));
//! assert_eq!(installed.len(), 1);
//! assert_eq!(dispatcher.notify(&ChangeEvent::new("leds.MASTER_CAUTION", 1)), 1);
//! # Ok::<(), opencockpit_errors::ConfigError>(())
//! ```

#![deny(static_mut_refs)]

pub mod rule;
pub mod table;

pub use rule::{Action, MappingRule, Signal, Transform};
pub use table::{InstalledMappings, MAPPING_SCHEMA_VERSION, MappingTable};
