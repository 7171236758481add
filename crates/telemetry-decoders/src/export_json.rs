//! Export.lua JSON document decoder.
//!
//! Each datagram carries one self-contained document:
//!
//! ```json
//! {
//!   "aircraft": "FA-18C_hornet",
//!   "leds":    { "MASTER_CAUTION": 1, "GEAR_POS": 1.0 },
//!   "payload": { "cannon_ammo": 578, "station_2_count": 1 },
//!   "flight":  { "aoa": 4.2, "g_x": 0.01 }
//! }
//! ```
//!
//! Every top-level object is a section; leaves become `"section.leaf"` paths
//! (nested objects keep adding dotted segments). Arrays and nulls are skipped.

use cockpit_telemetry_core::{
    ChangeEvent, ChangeSource, DecodeEvent, DecoderStats, FieldCache, FieldPath, FieldSnapshot,
    FieldValue, VehicleIdentity,
};
use opencockpit_errors::DecodeError;
use serde_json::{Map, Value};
use tracing::info;

pub const PROTOCOL: &str = "export-json";

/// Top-level key naming the active vehicle.
pub const IDENTITY_KEY: &str = "aircraft";

#[derive(Debug)]
pub struct ExportJsonDecoder {
    identity_key: String,
    cache: FieldCache,
    /// Every field of the last accepted document.
    latest: FieldSnapshot,
    identity: Option<VehicleIdentity>,
    stats: DecoderStats,
}

impl ExportJsonDecoder {
    pub fn new() -> Self {
        Self::with_identity_key(IDENTITY_KEY)
    }

    pub fn with_identity_key(identity_key: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            cache: FieldCache::new(),
            latest: FieldSnapshot::new(),
            identity: None,
            stats: DecoderStats::default(),
        }
    }

    fn parse(bytes: &[u8]) -> Result<Map<String, Value>, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let text =
            std::str::from_utf8(bytes).map_err(|e| DecodeError::NotUtf8(e.to_string()))?;
        let value: Value = serde_json::from_str(text)
            .map_err(|e| DecodeError::invalid_json(e.line(), e.column(), e.to_string()))?;
        match value {
            Value::Object(document) => Ok(document),
            _ => Err(DecodeError::NotADocument),
        }
    }

    fn accept(&mut self, document: &Map<String, Value>) -> Vec<DecodeEvent> {
        let mut events = Vec::new();

        if let Some(raw) = document.get(&self.identity_key).and_then(identity_text)
            && self.identity.as_ref().is_none_or(|current| current.raw != raw)
        {
            let identity = VehicleIdentity::verbatim(raw);
            info!(vehicle = %identity, "vehicle identity changed");
            self.stats.identity_changes = self.stats.identity_changes.saturating_add(1);
            self.identity = Some(identity.clone());
            events.push(DecodeEvent::IdentityChanged(identity));
        }

        let mut fields = Vec::new();
        for (key, value) in document {
            if key == &self.identity_key {
                continue;
            }
            if let Value::Object(section) = value {
                flatten(key, section, &mut fields);
            }
        }

        self.latest.clear();
        for (path, value) in fields {
            if self.cache.update(&path, &value) {
                self.stats.events = self.stats.events.saturating_add(1);
                events.push(ChangeEvent::new(path.clone(), value.clone()).into());
            }
            self.latest.insert(path, value);
        }
        events
    }
}

impl Default for ExportJsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn identity_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(FieldValue::Int)
            .or_else(|| n.as_f64().map(FieldValue::Float)),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn flatten(prefix: &str, object: &Map<String, Value>, out: &mut Vec<(FieldPath, FieldValue)>) {
    for (key, value) in object {
        let path = format!("{prefix}.{key}");
        match value {
            Value::Object(inner) => flatten(&path, inner, out),
            other => {
                if let Some(field) = scalar(other) {
                    out.push((FieldPath::named(path), field));
                }
            }
        }
    }
}

impl ChangeSource for ExportJsonDecoder {
    fn protocol(&self) -> &'static str {
        PROTOCOL
    }

    fn feed(&mut self, bytes: &[u8]) -> Result<Vec<DecodeEvent>, DecodeError> {
        let document = match Self::parse(bytes) {
            Ok(document) => document,
            Err(e) => {
                self.stats.decode_errors = self.stats.decode_errors.saturating_add(1);
                return Err(e);
            }
        };
        self.stats.units = self.stats.units.saturating_add(1);
        Ok(self.accept(&document))
    }

    fn snapshot(&self) -> &FieldSnapshot {
        &self.latest
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
        self.cache.clear();
        self.latest.clear();
        self.identity = None;
        self.stats = DecoderStats::default();
    }
}
