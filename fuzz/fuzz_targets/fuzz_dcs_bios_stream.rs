//! Fuzzes the DCS-BIOS binary stream decoder, including reassembly across
//! feed calls.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_dcs_bios_stream
#![no_main]
use cockpit_telemetry_core::ChangeSource;
use cockpit_telemetry_decoders::DcsBiosDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must never panic on arbitrary bytes, however they are split.
    let mut decoder = DcsBiosDecoder::new();
    let cut = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let (head, tail) = data.split_at(cut);
    for chunk in [head, tail] {
        if let Ok(events) = decoder.feed(chunk) {
            std::hint::black_box(events);
        }
    }
    std::hint::black_box(decoder.snapshot());
});
