//! Mapping tables loaded from disk and driven through both decoders.

use cockpit_telemetry_core::IndicatorId;
use cockpit_telemetry_decoders::{DcsBiosDecoder, ExportJsonDecoder};
use opencockpit_dispatch::TelemetryPipeline;
use opencockpit_mappings::{MappingTable, Signal, Transform};
use opencockpit_test_helpers::prelude::*;
use proptest::prelude::*;
use std::fmt::Write as _;
use std::io::Write as _;

const PTO2_TABLE: &str = r#"
schema_version: 1
vehicle: FA18C
rules:
  - path: "0x7408"
    bits: { mask: 0x0800, shift: 11 }
    action: { discrete: { device: pto2, index: 1 } }
    description: Nose gear light
  - path: "0x7408"
    bits: { mask: 0x4000, shift: 14 }
    action: { switched: { target: { device: pto2, index: 0 }, on: 255 } }
    description: Gear handle light
  - path: "0x7456"
    transform: { scale: { factor: 0.0038910505836575876 } }
    action: { level: { device: pto2, index: 9 } }
    description: Console backlight
"#;

const THROTTLE_TABLE: &str = r#"
rules:
  - path: leds.AA_MODE
    action: { discrete: { device: throttle, index: 2 } }
  - path: leds.CONSOLE_BRIGHTNESS
    transform: { scale: { factor: 255.0, floor: 13 } }
    action: { level: { device: throttle, index: 0 } }
"#;

fn render(sink: &RecordingSink) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    for command in sink.commands() {
        match command {
            SinkCommand::Discrete { id, on } => writeln!(out, "{id} = {on}")?,
            SinkCommand::Level { id, level } => writeln!(out, "{id} @ {level}")?,
            SinkCommand::Motor { channel, intensity } => {
                writeln!(out, "motor {channel} @ {intensity}")?
            }
        }
    }
    Ok(out)
}

#[test]
fn gear_panel_follows_register_stream() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(PTO2_TABLE.as_bytes())?;
    let table = MappingTable::load(file.path())?;

    let sink = RecordingSink::shared();
    let mut pipeline = TelemetryPipeline::new(DcsBiosDecoder::new());
    let installed = table.install(pipeline.dispatcher_mut(), sink.clone());
    assert_eq!(installed.len(), 3);

    for (gear, backlight) in [(0x4800, 0), (0x4800, 32768), (0x0800, 65535), (0x0000, 65535)] {
        pipeline.ingest(
            &DcsBiosStream::new()
                .sync()
                .register(0x7408, gear)
                .register(0x7456, backlight)
                .build(),
        )?;
    }

    insta::assert_snapshot!(render(&sink)?, @r"
    pto2[1] = true
    pto2[0] @ 255
    pto2[9] @ 0
    pto2[9] @ 127
    pto2[0] @ 0
    pto2[9] @ 255
    pto2[1] = false
    ");
    Ok(())
}

#[test]
fn throttle_backlight_keeps_minimum_glow() -> TestResult {
    let table = MappingTable::from_yaml_str(THROTTLE_TABLE, "throttle.yaml")?;
    let sink = RecordingSink::shared();
    let mut pipeline = TelemetryPipeline::new(ExportJsonDecoder::new());
    table.install(pipeline.dispatcher_mut(), sink.clone());

    let console = IndicatorId::new("throttle", 0);
    let aa = IndicatorId::new("throttle", 2);
    for brightness in [0.0, 0.5, 1.0] {
        pipeline.ingest(
            &ExportDocument::new()
                .field("leds", "AA_MODE", 1)
                .field("leds", "CONSOLE_BRIGHTNESS", brightness)
                .to_bytes(),
        )?;
    }

    assert_eq!(sink.discrete_history(&aa), vec![true]);
    assert_eq!(sink.last_level(&console), Some(255));
    assert_eq!(
        sink.commands()
            .iter()
            .filter(|c| matches!(c, SinkCommand::Level { id, .. } if *id == console))
            .count(),
        3
    );

    table.quiesce(sink.as_ref());
    assert_eq!(sink.last_discrete(&aa), Some(false));
    assert_eq!(sink.last_level(&console), Some(0));
    Ok(())
}

#[test]
fn missing_file_is_a_read_error() {
    let err = MappingTable::load("/nonexistent/opencockpit/mappings.yaml")
        .err()
        .map(|e| e.to_string());
    assert!(
        err.as_deref()
            .is_some_and(|e| e.starts_with("Failed to read /nonexistent/opencockpit/mappings.yaml"))
    );
}

proptest! {
    #[test]
    fn scale_output_respects_floor_and_order(
        floor in any::<u8>(),
        x in -2.0f64..2.0,
        y in -2.0f64..2.0,
    ) {
        let transform = Transform::unit_brightness(floor);
        let level = |v: f64| match transform.apply(&v.into()) {
            Ok(Signal::Level(level)) => Some(level),
            _ => None,
        };
        let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
        let (lo, hi) = (level(lo), level(hi));
        prop_assert!(lo.is_some_and(|l| l >= floor));
        prop_assert!(lo <= hi);
    }
}
