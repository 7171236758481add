//! Test fixture builders for both wire formats.

use serde_json::{Map, Value};

const SYNC: [u8; 4] = [0x55; 4];
const METADATA_START: u16 = 0xFFFE;
const METADATA_END: u16 = 0xFFFF;

/// Builder for a DCS-BIOS export byte stream.
///
/// ```rust
/// use opencockpit_test_helpers::fixtures::DcsBiosStream;
///
/// let bytes = DcsBiosStream::new()
///     .sync()
///     .registers(0x7408, &[0x0200])
///     .build();
/// assert_eq!(bytes.len(), 4 + 4 + 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DcsBiosStream {
    bytes: Vec<u8>,
}

impl DcsBiosStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(mut self) -> Self {
        self.bytes.extend_from_slice(&SYNC);
        self
    }

    /// Raw record; the payload may have odd length.
    pub fn record(mut self, base: u16, payload: &[u8]) -> Self {
        let count = u16::try_from(payload.len()).unwrap();
        self.bytes.extend_from_slice(&base.to_le_bytes());
        self.bytes.extend_from_slice(&count.to_le_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Record header announcing `declared` payload bytes, followed by only
    /// `partial` of them.
    pub fn truncated(mut self, base: u16, declared: u16, partial: &[u8]) -> Self {
        self.bytes.extend_from_slice(&base.to_le_bytes());
        self.bytes.extend_from_slice(&declared.to_le_bytes());
        self.bytes.extend_from_slice(partial);
        self
    }

    /// Record of consecutive 16-bit registers starting at `base`.
    pub fn registers(self, base: u16, words: &[u16]) -> Self {
        let payload: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.record(base, &payload)
    }

    pub fn register(self, address: u16, value: u16) -> Self {
        self.registers(address, &[value])
    }

    /// Metadata block announcing `name`, NUL-terminated and split across
    /// `chunk`-sized records.
    pub fn vehicle_name(self, name: &str, chunk: usize) -> Self {
        let mut text = name.as_bytes().to_vec();
        text.push(0);
        let mut stream = self.record(METADATA_START, &[]);
        for piece in text.chunks(chunk.max(1)) {
            stream = stream.record(0x0000, piece);
        }
        stream.record(METADATA_END, &[])
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Builder for an Export.lua JSON document.
///
/// ```rust
/// use opencockpit_test_helpers::fixtures::ExportDocument;
///
/// let doc = ExportDocument::new()
///     .aircraft("FA-18C_hornet")
///     .field("leds", "MASTER_CAUTION", 1)
///     .to_json();
/// assert_eq!(doc, r#"{"aircraft":"FA-18C_hornet","leds":{"MASTER_CAUTION":1}}"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExportDocument {
    root: Map<String, Value>,
}

impl ExportDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aircraft(mut self, name: &str) -> Self {
        self.root
            .insert("aircraft".to_string(), Value::String(name.to_string()));
        self
    }

    pub fn field(mut self, section: &str, key: &str, value: impl Into<Value>) -> Self {
        let entry = self
            .root
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    /// Grounded, gear down and locked, no rotation.
    pub fn parked(self) -> Self {
        self.field("leds", "WOW_LEFT", 1)
            .field("leds", "WOW_RIGHT", 1)
            .field("leds", "GEAR_POS", 1.0)
            .field("leds", "NOSE_GEAR", 0)
            .field("flight", "aoa", 0.0)
            .field("flight", "g_x", 0.0)
    }

    /// Airborne, gear up.
    pub fn cruising(self) -> Self {
        self.field("leds", "WOW_LEFT", 0)
            .field("leds", "WOW_RIGHT", 0)
            .field("leds", "GEAR_POS", 0.0)
            .field("leds", "NOSE_GEAR", 0)
            .field("flight", "aoa", 4.0)
            .field("flight", "g_x", 0.0)
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.root.clone()).to_string()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().into_bytes()
    }
}
