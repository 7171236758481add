//! Frame decoders for simulator telemetry.
//!
//! Two wire formats share the [`ChangeSource`] contract:
//!
//! - [`DcsBiosDecoder`]: the DCS-BIOS export stream, a sequence of
//!   length-prefixed little-endian register records behind a four-byte sync
//!   marker, with the vehicle name carried in a bracketed metadata block.
//! - [`ExportJsonDecoder`]: one JSON document per datagram, as produced by an
//!   `Export.lua` script; top-level objects are sections of scalar leaves.
//!
//! Both emit a [`DecodeEvent`] only when a field differs from its cached
//! value, and report vehicle changes as a separate identity event.
//!
//! ```
//! use cockpit_telemetry_decoders::{ChangeSource, ExportJsonDecoder};
//!
//! let mut decoder = ExportJsonDecoder::new();
//! let events = decoder.feed(br#"{"leds": {"MASTER_CAUTION": 1}}"#)?;
//! assert_eq!(events.len(), 1);
//! assert!(decoder.feed(br#"{"leds": {"MASTER_CAUTION": 1}}"#)?.is_empty());
//! # Ok::<(), cockpit_telemetry_decoders::DecodeError>(())
//! ```

#![deny(static_mut_refs)]

pub mod dcs_bios;
pub mod export_json;
pub mod identity;

pub use cockpit_telemetry_core::{ChangeSource, DecodeEvent, DecoderStats};
pub use dcs_bios::DcsBiosDecoder;
pub use export_json::ExportJsonDecoder;
pub use identity::normalize_vehicle_name;
pub use opencockpit_errors::DecodeError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format of the incoming telemetry stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// DCS-BIOS binary register stream.
    Binary,
    /// Export.lua JSON documents.
    #[default]
    Structured,
}

impl Protocol {
    pub fn decoder(self) -> Box<dyn ChangeSource> {
        match self {
            Protocol::Binary => Box::new(DcsBiosDecoder::new()),
            Protocol::Structured => Box::new(ExportJsonDecoder::new()),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Binary => f.write_str(dcs_bios::PROTOCOL),
            Protocol::Structured => f.write_str(export_json::PROTOCOL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_selects_decoder() {
        assert_eq!(Protocol::Binary.decoder().protocol(), "dcs-bios");
        assert_eq!(Protocol::Structured.decoder().protocol(), "export-json");
        assert_eq!(Protocol::default(), Protocol::Structured);
    }
}
