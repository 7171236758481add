//! Approach and landing over the structured export, through the full bridge.

use anyhow::Result;
use cockpit_bridge::BridgeConfig;
use cockpit_integration_tests::{CockpitHarness, FlightState};
use cockpit_telemetry_core::{IndicatorId, LinkState, MotorChannel};
use opencockpit_haptics::EffectKind;

const AIRCRAFT: &str = "FA-18C_hornet";

const LANDING_PANEL: &str = r#"
rules:
  - path: leds.NOSE_GEAR
    action: { discrete: { device: pto2, index: 3 } }
    description: Gear in transit
  - path: leds.MASTER_CAUTION
    action: { discrete: { device: ufc, index: 7 } }
"#;

fn transit_lamp() -> IndicatorId {
    IndicatorId::new("pto2", 3)
}

#[test]
fn landing_drives_motors_and_lamps() -> Result<()> {
    cockpit_integration_tests::init_test_tracing();
    let mut cockpit = CockpitHarness::with_table(BridgeConfig::default(), LANDING_PANEL)?;
    let approach = FlightState::APPROACH;

    assert_eq!(cockpit.send(&approach.document(AIRCRAFT)), LinkState::Active);
    assert_eq!(cockpit.motors(), (Some(0), Some(0)));

    let transit = approach.gear_in_transit();
    cockpit.send_after(50, &transit.document(AIRCRAFT));
    assert_eq!(cockpit.motors(), (Some(65), Some(91)));
    assert_eq!(cockpit.lamp(&transit_lamp()), Some(true));

    let locked = transit.gear_locked();
    cockpit.send_after(50, &locked.document(AIRCRAFT));
    assert_eq!(cockpit.motors(), (Some(150), Some(210)));
    assert_eq!(cockpit.lamp(&transit_lamp()), Some(false));

    let touchdown = locked.touchdown();
    cockpit.send_after(50, &touchdown.document(AIRCRAFT));
    assert_eq!(cockpit.motors(), (Some(255), Some(255)));

    let rolled_out = touchdown.rolled_out();
    for _ in 0..16 {
        cockpit.send_after(50, &rolled_out.document(AIRCRAFT));
    }
    assert_eq!(cockpit.motors(), (Some(0), Some(0)));

    let engine = cockpit.bridge().engine().lock();
    assert_eq!(engine.effect(EffectKind::LandingImpact).trigger_count, 1);
    assert_eq!(engine.effect(EffectKind::GearClunk).trigger_count, 1);
    drop(engine);

    assert_eq!(
        cockpit.sink().discrete_history(&transit_lamp()),
        vec![false, true, false]
    );
    let status = cockpit.bridge().status();
    assert_eq!(status.vehicle.as_deref(), Some(AIRCRAFT));
    assert_eq!(status.datagrams, 20);
    assert_eq!(status.ticks, 20);
    Ok(())
}

#[test]
fn channel_b_never_trails_channel_a_during_landing() -> Result<()> {
    let mut cockpit = CockpitHarness::new(BridgeConfig::default())?;
    let approach = FlightState::APPROACH;
    let script = [
        approach,
        approach.gear_in_transit(),
        approach.gear_locked(),
        approach.gear_locked().touchdown(),
        approach.gear_locked().touchdown().rolled_out(),
    ];
    for state in script {
        cockpit.send_after(50, &state.document(AIRCRAFT));
    }

    let a = cockpit.sink().motor_history(MotorChannel::A);
    let b = cockpit.sink().motor_history(MotorChannel::B);
    assert_eq!(a.len(), script.len());
    assert!(a.iter().zip(&b).all(|(a, b)| b >= a), "A {a:?} B {b:?}");
    Ok(())
}

#[test]
fn gun_burst_and_landing_share_the_motors() -> Result<()> {
    let mut cockpit = CockpitHarness::new(BridgeConfig::default())?;
    let mut state = FlightState::APPROACH.gear_locked();
    cockpit.send(&state.document(AIRCRAFT));

    cockpit.send_after(500, &state.document(AIRCRAFT));
    assert_eq!(cockpit.motors(), (Some(0), Some(0)));

    state.cannon_ammo -= 10;
    cockpit.send_after(10, &state.document(AIRCRAFT));
    assert_eq!(cockpit.motors(), (Some(255), Some(255)));

    // No further rounds: the burst ends on its own.
    cockpit.send_after(200, &state.document(AIRCRAFT));
    assert_eq!(cockpit.motors(), (Some(0), Some(0)));
    assert_eq!(
        cockpit
            .bridge()
            .engine()
            .lock()
            .effect(EffectKind::GunFire)
            .trigger_count,
        1
    );
    Ok(())
}
