//! Fuzzes the Export.lua JSON document decoder.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_export_json
#![no_main]
use cockpit_telemetry_core::ChangeSource;
use cockpit_telemetry_decoders::ExportJsonDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are expected, panics are not. Feeding twice exercises change
    // suppression against the cache built by the first pass.
    let mut decoder = ExportJsonDecoder::new();
    for _ in 0..2 {
        if let Ok(events) = decoder.feed(data) {
            std::hint::black_box(events);
        }
    }
});
