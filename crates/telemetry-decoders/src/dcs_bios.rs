//! DCS-BIOS binary export stream decoder.
//!
//! Wire format (all integers little-endian):
//!
//! ```text
//! 55 55 55 55                     sync marker, may repeat
//! AA AA CC CC  DD * CC            record: base address, byte count, payload
//! AA AA CC CC  DD * CC            ...
//! ```
//!
//! Record payloads are 16-bit registers; the register at byte offset `n`
//! lives at address `base + n`. Records addressed to [`METADATA_START`] and
//! [`METADATA_END`] bracket a NUL-terminated vehicle name instead.
//!
//! A sync marker never appears inside a record. One found within a record's
//! declared payload ends that record early: it is dropped, counted in
//! `decode_errors`, and decoding resumes at the marker.

use cockpit_telemetry_core::{
    ChangeEvent, ChangeSource, DecodeEvent, DecoderStats, FieldCache, FieldPath, FieldSnapshot,
    FieldValue, VehicleIdentity,
};
use opencockpit_errors::DecodeError;
use tracing::{debug, info, warn};

use crate::identity::normalize_vehicle_name;

pub const PROTOCOL: &str = "dcs-bios";

pub const SYNC_BYTE: u8 = 0x55;
pub const METADATA_START: u16 = 0xFFFE;
pub const METADATA_END: u16 = 0xFFFF;
/// Largest vehicle-name block accepted before it is abandoned.
pub const METADATA_LIMIT: usize = 1000;

const HEADER_LEN: usize = 4;
const SYNC: [u8; HEADER_LEN] = [SYNC_BYTE; HEADER_LEN];

/// Stateful decoder for the DCS-BIOS register stream.
///
/// Bytes that do not yet form a complete record are kept until the next
/// `feed`, so a stream split at arbitrary points decodes to the same events
/// as the unsplit stream.
#[derive(Debug, Default)]
pub struct DcsBiosDecoder {
    buffer: Vec<u8>,
    cache: FieldCache,
    /// `Some` between a metadata start and end record.
    metadata: Option<Vec<u8>>,
    identity: Option<VehicleIdentity>,
    stats: DecoderStats,
}

impl DcsBiosDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a record.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_collecting_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    /// Last raw register value seen at `address`.
    pub fn register(&self, address: u16) -> Option<u16> {
        self.cache
            .get(&FieldPath::Address(address))
            .and_then(FieldValue::as_i64)
            .and_then(|v| u16::try_from(v).ok())
    }

    fn process_record(&mut self, base: u16, payload: &[u8], events: &mut Vec<DecodeEvent>) {
        match base {
            METADATA_START => {
                if self.metadata.is_some() {
                    debug!("metadata block restarted before end marker");
                }
                self.metadata = Some(Vec::new());
            }
            METADATA_END => match self.metadata.take() {
                Some(mut block) => {
                    if self.append_metadata(&mut block, payload) {
                        self.finish_metadata(&block, events);
                    }
                }
                None => debug!("metadata end marker without start, ignored"),
            },
            _ => match self.metadata.take() {
                Some(mut block) => {
                    if self.append_metadata(&mut block, payload) {
                        self.metadata = Some(block);
                    }
                }
                None => self.decode_registers(base, payload, events),
            },
        }
    }

    /// Returns `false` if the block overflowed and was abandoned.
    fn append_metadata(&mut self, block: &mut Vec<u8>, payload: &[u8]) -> bool {
        if block.len().saturating_add(payload.len()) > METADATA_LIMIT {
            self.stats.metadata_overflows = self.stats.metadata_overflows.saturating_add(1);
            let error = DecodeError::MetadataOverflow {
                limit: METADATA_LIMIT,
            };
            warn!(protocol = PROTOCOL, error = %error, "metadata block dropped");
            return false;
        }
        block.extend_from_slice(payload);
        true
    }

    fn finish_metadata(&mut self, block: &[u8], events: &mut Vec<DecodeEvent>) {
        let text: String = block.utf8_chunks().map(|chunk| chunk.valid()).collect();
        let raw = text.trim_end_matches('\0');
        if raw.is_empty() {
            return;
        }
        if self.identity.as_ref().is_some_and(|current| current.raw == raw) {
            return;
        }
        let identity = VehicleIdentity::new(raw, normalize_vehicle_name(raw));
        info!(raw = %identity.raw, vehicle = %identity.normalized, "vehicle identity changed");
        self.stats.identity_changes = self.stats.identity_changes.saturating_add(1);
        self.identity = Some(identity.clone());
        events.push(DecodeEvent::IdentityChanged(identity));
    }

    /// A sync word inside a record's declared payload means the record never
    /// completed; its bytes are discarded and decoding resumes at the sync.
    fn drop_truncated(&mut self, base: u16, declared: usize, received: usize) {
        self.stats.decode_errors = self.stats.decode_errors.saturating_add(1);
        let error = DecodeError::TruncatedRecord {
            address: base,
            declared,
            received,
        };
        warn!(protocol = PROTOCOL, error = %error, "truncated record dropped");
    }

    fn decode_registers(&mut self, base: u16, payload: &[u8], events: &mut Vec<DecodeEvent>) {
        for (index, word) in payload.chunks_exact(2).enumerate() {
            let Some(address) = index
                .checked_mul(2)
                .and_then(|offset| u16::try_from(offset).ok())
                .and_then(|offset| base.checked_add(offset))
            else {
                break;
            };
            let &[lo, hi] = word else {
                continue;
            };
            let path = FieldPath::Address(address);
            let value = FieldValue::from(u16::from_le_bytes([lo, hi]));
            if self.cache.update(&path, &value) {
                self.stats.events = self.stats.events.saturating_add(1);
                events.push(ChangeEvent { path, value }.into());
            }
        }
    }
}

fn find_sync(bytes: &[u8]) -> Option<usize> {
    bytes.windows(HEADER_LEN).position(|window| window == SYNC)
}

impl ChangeSource for DcsBiosDecoder {
    fn protocol(&self) -> &'static str {
        PROTOCOL
    }

    fn feed(&mut self, bytes: &[u8]) -> Result<Vec<DecodeEvent>, DecodeError> {
        self.stats.units = self.stats.units.saturating_add(1);
        self.buffer.extend_from_slice(bytes);

        let buffer = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        let mut consumed = 0usize;

        while let Some(header) = buffer.get(consumed..consumed.saturating_add(HEADER_LEN)) {
            if header == SYNC {
                consumed = consumed.saturating_add(HEADER_LEN);
                continue;
            }
            let &[a0, a1, c0, c1] = header else {
                break;
            };
            let base = u16::from_le_bytes([a0, a1]);
            let count = usize::from(u16::from_le_bytes([c0, c1]));
            let start = consumed.saturating_add(HEADER_LEN);
            let end = start.saturating_add(count);
            let declared = buffer.get(start..end.min(buffer.len())).unwrap_or_default();
            if let Some(offset) = find_sync(declared) {
                self.drop_truncated(base, count, offset);
                consumed = start.saturating_add(offset);
                continue;
            }
            let Some(payload) = buffer.get(start..end) else {
                break;
            };
            self.process_record(base, payload, &mut events);
            consumed = end;
        }

        self.buffer = buffer;
        self.buffer.drain(..consumed.min(self.buffer.len()));
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
        self.buffer.clear();
        self.cache.clear();
        self.metadata = None;
        self.identity = None;
        self.stats = DecoderStats::default();
    }
}
