//! Fuzzes mapping table parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_mapping_table
#![no_main]
use libfuzzer_sys::fuzz_target;
use opencockpit_mappings::MappingTable;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(table) = MappingTable::from_yaml_str(text, "fuzz")
    {
        std::hint::black_box(table.targets());
    }
});
