//! Bridge behaviour across link transitions, vehicle changes and shutdown.

use cockpit_bridge::{
    Bridge, BridgeConfig, ChannelDatagramSource, serve_config_file, stop_signal,
};
use cockpit_telemetry_core::{IndicatorId, LinkState, ManualClock, MotorChannel};
use opencockpit_haptics::EffectKind;
use opencockpit_mappings::{Action, MappingRule, MappingTable, Transform};
use opencockpit_test_helpers::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn hornet(ammo: i64) -> Vec<u8> {
    ExportDocument::new()
        .aircraft("FA-18C_hornet")
        .cruising()
        .field("payload", "cannon_ammo", ammo)
        .field("leds", "MASTER_CAUTION", 1)
        .to_bytes()
}

fn caution_lamp() -> IndicatorId {
    IndicatorId::new("ufc", 7)
}

fn caution_table() -> MappingTable {
    MappingTable::new(vec![
        MappingRule::new(
            "leds.MASTER_CAUTION",
            Transform::Truthy,
            Action::Discrete(caution_lamp()),
        )
        .describe("Master caution"),
    ])
}

#[test]
fn link_lifecycle_drives_and_quiesces_outputs() -> TestResult {
    let clock = Arc::new(ManualClock::new());
    let sink = RecordingSink::shared();
    let mut bridge = Bridge::with_clock(BridgeConfig::default(), sink.clone(), clock.clone())?;

    assert_eq!(bridge.step(None), LinkState::Idle);
    assert!(sink.is_empty());

    assert_eq!(bridge.step(Some(&hornet(578))), LinkState::Active);
    assert_motors!(sink, 0, 0);
    clock.advance_ms(10);
    bridge.step(Some(&hornet(577)));
    assert_motors!(sink, 255, 255);

    clock.advance_ms(1990);
    assert_eq!(bridge.step(None), LinkState::Active);
    assert_motors!(sink, 0, 0);

    sink.clear();
    clock.advance_ms(10);
    assert_eq!(bridge.step(None), LinkState::Idle);
    assert_motors!(sink, 0, 0);
    assert_eq!(
        bridge.engine().lock().effect(EffectKind::GunFire).trigger_count,
        0
    );

    // No further ticks while idle.
    sink.clear();
    clock.advance_ms(5000);
    bridge.step(None);
    assert!(sink.is_empty());

    // Decoder state was reset: the first ammo value is a baseline again.
    assert_eq!(bridge.step(Some(&hornet(577))), LinkState::Active);
    assert_motors!(sink, 0, 0);
    let status = bridge.status();
    assert_eq!(status.links_established, 2);
    assert_eq!(status.datagrams, 3);
    Ok(())
}

#[test]
fn undecodable_datagrams_do_not_refresh_the_link() -> TestResult {
    let clock = Arc::new(ManualClock::new());
    let sink = RecordingSink::shared();
    let mut bridge = Bridge::with_clock(BridgeConfig::default(), sink, clock.clone())?;

    bridge.step(Some(&hornet(578)));
    clock.advance_ms(1500);
    bridge.step(Some(b"{not json"));
    clock.advance_ms(500);
    assert_eq!(bridge.step(Some(b"[1, 2]")), LinkState::Idle);

    insta::assert_snapshot!(
        bridge.status().to_string(),
        @"NO DATA | vehicle: N/A | datagrams: 3 | decode errors: 2"
    );
    Ok(())
}

#[test]
fn stalled_binary_record_is_counted_and_stream_recovers() -> TestResult {
    let clock = Arc::new(ManualClock::new());
    let sink = RecordingSink::shared();
    let lamp = IndicatorId::new("ufc", 7);
    let table = MappingTable::new(vec![MappingRule::new(
        0x740Cu16,
        Transform::Truthy,
        Action::Discrete(lamp.clone()),
    )]);
    let mut bridge = Bridge::with_clock(BridgeConfig::binary(), sink.clone(), clock.clone())?
        .with_mappings(table);

    bridge.step(Some(&DcsBiosStream::new().sync().truncated(0x1000, 0xFFFF, &[1, 2]).build()));
    for value in [1, 0, 1] {
        clock.advance_ms(10);
        bridge.step(Some(&DcsBiosStream::new().sync().register(0x740C, value).build()));
    }

    assert_eq!(sink.discrete_history(&lamp), vec![true, false, true]);
    insta::assert_snapshot!(
        bridge.status().to_string(),
        @"RECEIVING DATA | vehicle: N/A | datagrams: 4 | decode errors: 1"
    );
    Ok(())
}

#[test]
fn status_reports_vehicle_while_active() -> TestResult {
    let clock = Arc::new(ManualClock::new());
    let mut bridge =
        Bridge::with_clock(BridgeConfig::default(), RecordingSink::shared(), clock)?;
    bridge.step(Some(&hornet(578)));

    insta::assert_snapshot!(
        bridge.status().to_string(),
        @"RECEIVING DATA | vehicle: FA-18C_hornet | datagrams: 1 | decode errors: 0"
    );
    Ok(())
}

#[test]
fn vehicle_specific_mappings_follow_identity() -> TestResult {
    let clock = Arc::new(ManualClock::new());
    let sink = RecordingSink::shared();
    let gear = IndicatorId::new("pto2", 1);
    let table = MappingTable::new(vec![
        MappingRule::new(0x7408u16, Transform::Truthy, Action::Discrete(gear.clone()))
            .with_bits(cockpit_telemetry_core::BitField::new(0x0800, 11)),
    ])
    .for_vehicle("FA18C");
    let mut bridge = Bridge::with_clock(BridgeConfig::binary(), sink.clone(), clock)?
        .with_mappings(table);
    assert_eq!(bridge.status().mappings_installed, 0);

    // Registers before any vehicle is known.
    bridge.step(Some(&DcsBiosStream::new().sync().register(0x7408, 0x0800).build()));
    assert_eq!(sink.discrete_history(&gear), Vec::<bool>::new());

    // The hornet arrives: rules install and the cached register is replayed.
    bridge.step(Some(
        &DcsBiosStream::new()
            .sync()
            .vehicle_name("FA-18C_hornet", 6)
            .build(),
    ));
    assert_eq!(bridge.status().mappings_installed, 1);
    assert_eq!(sink.discrete_history(&gear), vec![true]);

    // A different vehicle: rules come off and the lamp goes dark.
    bridge.step(Some(
        &DcsBiosStream::new()
            .sync()
            .vehicle_name("F-16C_50", 6)
            .build(),
    ));
    assert_eq!(bridge.status().mappings_installed, 0);
    assert_eq!(sink.discrete_history(&gear), vec![true, false]);
    assert_eq!(bridge.status().vehicle.as_deref(), Some("F16C"));
    Ok(())
}

#[test]
fn hot_plug_rewrites_current_state() -> TestResult {
    let clock = Arc::new(ManualClock::new());
    let sink = RecordingSink::shared();
    let mut bridge = Bridge::with_clock(BridgeConfig::default(), sink.clone(), clock)?
        .with_mappings(caution_table());
    bridge.step(Some(&hornet(578)));
    assert_eq!(sink.discrete_history(&caution_lamp()), vec![true]);

    sink.clear();
    bridge.step(Some(&hornet(578)));
    assert_eq!(sink.discrete_history(&caution_lamp()), Vec::<bool>::new());

    assert!(bridge.hot_plug() > 0);
    assert_eq!(sink.discrete_history(&caution_lamp()), vec![true]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn run_loop_follows_link_and_stops_promptly() -> TestResult {
    let sink = RecordingSink::shared();
    let mut bridge =
        Bridge::new(BridgeConfig::default(), sink.clone())?.with_mappings(caution_table());
    let (tx, mut source) = ChannelDatagramSource::new(8);
    let (stop_tx, stop_rx) = stop_signal();
    let handle = tokio::spawn(async move { bridge.run(&mut source, stop_rx).await });

    tx.send(hornet(578)).await?;
    tx.send(hornet(577)).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.last_motor(MotorChannel::A), Some(255));
    assert_eq!(sink.last_discrete(&caution_lamp()), Some(true));

    // Freshness window passes: everything goes dark.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(sink.last_motor(MotorChannel::A), Some(0));
    assert_eq!(sink.last_discrete(&caution_lamp()), Some(false));

    let requested = tokio::time::Instant::now();
    stop_tx.send(true)?;
    let status = handle.await?;
    assert!(requested.elapsed() <= Duration::from_millis(100));
    assert_eq!(status.link, LinkState::Idle);
    assert_eq!(status.datagrams, 2);
    assert_eq!(status.links_established, 1);
    drop(tx);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_source_ends_the_loop_dark() -> TestResult {
    let sink = RecordingSink::shared();
    let mut bridge = Bridge::new(BridgeConfig::default(), sink.clone())?;
    let (tx, mut source) = ChannelDatagramSource::new(1);
    let (_stop_tx, stop_rx) = stop_signal();

    tx.send(hornet(578)).await?;
    drop(tx);
    let status = bridge.run(&mut source, stop_rx).await;

    assert_eq!(status.datagrams, 1);
    assert_motors!(sink, 0, 0);
    Ok(())
}

#[tokio::test]
async fn missing_config_file_is_reported_with_context() {
    let (_stop_tx, stop_rx) = stop_signal();
    let result = serve_config_file(
        "/nonexistent/opencockpit/bridge.yaml",
        RecordingSink::shared(),
        stop_rx,
    )
    .await;
    let message = result.err().map(|e| format!("{e:#}"));
    assert!(message.as_deref().is_some_and(|m| {
        m.starts_with(
            "Failed to load bridge config /nonexistent/opencockpit/bridge.yaml: Failed to read",
        )
    }));
}
