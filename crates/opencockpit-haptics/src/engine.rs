//! The effect arbitration engine.

use crate::config::{HapticConfig, HapticInput};
use crate::constants::{
    GEAR_CLUNK_DURATION, GEAR_CLUNK_INTENSITY, GEAR_DOWN_POSITION, GEAR_TRANSIT_INTENSITY,
    GEAR_TRANSIT_LOWER, GEAR_TRANSIT_UPPER, GUN_FIRE_DURATION, GUN_FIRE_INTENSITY,
    LANDING_IMPACT_DURATION, LANDING_IMPACT_INTENSITY, ROD_COMPRESSED, ROD_UNLOADED,
    WEAPON_RELEASE_DURATION,
};
use crate::effects::{EffectBank, EffectKind, EffectState};
use crate::ramp::IntensityRamp;
use crate::release::ReleaseDetector;
use cockpit_telemetry_core::{
    Clock, FieldSnapshot, FieldValue, MonotonicClock, MotorChannel, OutputSink,
};
use opencockpit_dispatch::{Dispatcher, SubscriptionId};
use opencockpit_errors::{ObserverError, ObserverResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Engine shared between the dispatcher's observers and the tick loop.
pub type SharedEngine = Arc<Mutex<HapticEngine>>;

/// Raw and gained intensity for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelOutput {
    /// Maximum level over the active effects routed to the channel.
    pub raw: u8,
    /// `raw` after the channel gain; the value written to the sink.
    pub output: u8,
}

/// Outcome of one arbitration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArbitrationResult {
    pub a: ChannelOutput,
    pub b: ChannelOutput,
    /// Effects contributing to this pass, in [`EffectKind::ALL`] order.
    pub active: Vec<EffectKind>,
}

impl ArbitrationResult {
    pub fn channel(&self, channel: MotorChannel) -> ChannelOutput {
        match channel {
            MotorChannel::A => self.a,
            MotorChannel::B => self.b,
        }
    }
}

/// Latest value of every input, as far as the effects need them.
#[derive(Debug, Clone, Default, PartialEq)]
struct InputState {
    cannon_ammo: Option<f64>,
    wow_left: bool,
    wow_right: bool,
    gear_pos: Option<f64>,
    gear_locked: Option<bool>,
    /// Strut seen unloaded since the last impact.
    rod_armed: bool,
    aoa: Option<f64>,
    g_forward: Option<f64>,
}

impl InputState {
    fn grounded(&self) -> bool {
        self.wow_left || self.wow_right
    }

    /// Unknown gear position counts as down.
    fn gear_down(&self) -> bool {
        self.gear_pos.is_none_or(|pos| pos > GEAR_DOWN_POSITION)
    }
}

/// Independent effect state machines resolved into one command per motor
/// channel per tick.
///
/// Inputs arrive through [`HapticEngine::on_input`] (usually from dispatcher
/// observers installed by [`attach`]). [`HapticEngine::tick`] then polls the
/// release detector, expires pulses, recomputes continuous effects and
/// writes exactly one `set_motor` per channel.
///
/// # Examples
///
/// ```
/// use cockpit_telemetry_core::{FieldSnapshot, FieldValue, ManualClock, MotorChannel, NullSink};
/// use opencockpit_haptics::{HapticConfig, HapticEngine, HapticInput};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::new());
/// let mut engine = HapticEngine::with_clock(HapticConfig::default(), clock.clone());
///
/// engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(578))?;
/// engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(577))?;
///
/// let result = engine.tick(&FieldSnapshot::new(), &NullSink);
/// assert_eq!(result.channel(MotorChannel::A).output, 255);
///
/// clock.advance_ms(101);
/// let result = engine.tick(&FieldSnapshot::new(), &NullSink);
/// assert_eq!(result.channel(MotorChannel::A).output, 0);
/// # Ok::<(), opencockpit_errors::ObserverError>(())
/// ```
#[derive(Debug)]
pub struct HapticEngine {
    config: HapticConfig,
    clock: Arc<dyn Clock>,
    inputs: InputState,
    effects: EffectBank,
    release: ReleaseDetector,
    last: Option<ArbitrationResult>,
    ticks: u64,
}

impl HapticEngine {
    pub fn new(config: HapticConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    pub fn with_clock(config: HapticConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inputs: InputState::default(),
            effects: EffectBank::default(),
            release: ReleaseDetector::new(),
            last: None,
            ticks: 0,
        }
    }

    pub fn shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &HapticConfig {
        &self.config
    }

    /// Feed one dispatched value.
    ///
    /// Numeric inputs reject values with no numeric reading; the engine state
    /// is left unchanged in that case.
    pub fn on_input(&mut self, input: HapticInput, value: &FieldValue) -> ObserverResult {
        let now = self.clock.now();
        match input {
            HapticInput::WowLeft => self.inputs.wow_left = value.as_bool(),
            HapticInput::WowRight => self.inputs.wow_right = value.as_bool(),
            HapticInput::NoseGearLight => {
                let locked = !value.as_bool();
                let clunk = self.effects.get_mut(EffectKind::GearClunk);
                if self.inputs.gear_locked == Some(false) && locked && !clunk.active {
                    clunk.trigger(now, GEAR_CLUNK_INTENSITY, GEAR_CLUNK_DURATION);
                    debug!("Gear locked");
                }
                self.inputs.gear_locked = Some(locked);
            }
            HapticInput::CannonAmmo => {
                let ammo = numeric(value)?;
                let gun = self.effects.get_mut(EffectKind::GunFire);
                match self.inputs.cannon_ammo {
                    Some(previous) if ammo < previous => {
                        gun.trigger(now, GUN_FIRE_INTENSITY, GUN_FIRE_DURATION);
                    }
                    Some(previous) if ammo > previous => gun.cancel(),
                    _ => {}
                }
                self.inputs.cannon_ammo = Some(ammo);
            }
            HapticInput::GearPos => self.inputs.gear_pos = Some(numeric(value)?),
            HapticInput::RodLeft | HapticInput::RodRight => {
                let rod = numeric(value)?;
                self.track_impact(rod, now);
            }
            HapticInput::Aoa => self.inputs.aoa = Some(numeric(value)?),
            HapticInput::GForward => self.inputs.g_forward = Some(numeric(value)?),
        }
        Ok(())
    }

    /// An unloaded strut arms detection in any gear state; a compressed strut
    /// fires only with the gear down.
    fn track_impact(&mut self, rod: f64, now: std::time::Instant) {
        if rod < ROD_UNLOADED {
            self.inputs.rod_armed = true;
        } else if self.inputs.rod_armed && rod > ROD_COMPRESSED && self.inputs.gear_down() {
            self.inputs.rod_armed = false;
            self.effects.get_mut(EffectKind::LandingImpact).trigger(
                now,
                LANDING_IMPACT_INTENSITY,
                LANDING_IMPACT_DURATION,
            );
            debug!(rod, "Touchdown");
        }
    }

    /// Run one arbitration pass and write both motor channels to `sink`.
    ///
    /// `snapshot` is the decoder's view of the latest unit; it is only read by
    /// the release detector.
    pub fn tick(&mut self, snapshot: &FieldSnapshot, sink: &dyn OutputSink) -> ArbitrationResult {
        let now = self.clock.now();
        self.ticks = self.ticks.saturating_add(1);

        let grounded = self.inputs.grounded();
        if let Some(event) = self.release.poll(snapshot, grounded, &self.config.release) {
            info!(
                station = %event.station,
                previous = event.previous,
                current = ?event.current,
                store = event.identifier.as_deref().unwrap_or("unknown"),
                weight_kg = ?event.weight_kg,
                intensity = event.intensity,
                "Store released"
            );
            self.effects.get_mut(EffectKind::WeaponRelease).trigger(
                now,
                event.intensity,
                WEAPON_RELEASE_DURATION,
            );
        }

        for kind in EffectKind::ALL {
            if kind.is_pulse() {
                self.effects.get_mut(kind).expire(now);
            }
        }

        let transit = self
            .inputs
            .gear_pos
            .filter(|pos| *pos > GEAR_TRANSIT_LOWER && *pos < GEAR_TRANSIT_UPPER)
            .map(|_| GEAR_TRANSIT_INTENSITY);
        self.effects
            .get_mut(EffectKind::GearTransit)
            .set_continuous(transit);

        let buffet = if grounded {
            None
        } else {
            self.inputs
                .aoa
                .and_then(|aoa| IntensityRamp::AOA_BUFFET.evaluate(aoa))
        };
        self.effects
            .get_mut(EffectKind::AoaBuffet)
            .set_continuous(buffet);

        let wobble = if grounded {
            self.inputs
                .g_forward
                .and_then(|g| IntensityRamp::LANDING_ROLL.evaluate(g.abs()))
        } else {
            None
        };
        self.effects
            .get_mut(EffectKind::LandingRollWobble)
            .set_continuous(wobble);

        let result = self.arbitrate();
        for channel in MotorChannel::ALL {
            sink.set_motor(channel, result.channel(channel).output);
        }
        self.last = Some(result.clone());
        result
    }

    /// Combine the current effect levels without advancing any state.
    pub fn arbitrate(&self) -> ArbitrationResult {
        let raw = |channel: MotorChannel| {
            EffectKind::ALL
                .into_iter()
                .filter(|kind| self.config.routing.drives(*kind, channel))
                .map(|kind| self.effects.get(kind).level())
                .max()
                .unwrap_or(0)
        };
        let output = |channel: MotorChannel| {
            let raw = raw(channel);
            ChannelOutput {
                raw,
                output: self.config.gains.apply(channel, raw),
            }
        };
        ArbitrationResult {
            a: output(MotorChannel::A),
            b: output(MotorChannel::B),
            active: self.effects.active(),
        }
    }

    /// Return every effect and input to baseline (link lost). Effects re-arm
    /// as fields are dispatched again.
    pub fn reset(&mut self) {
        debug!(ticks = self.ticks, "Resetting haptic effects");
        self.inputs = InputState::default();
        self.effects.clear();
        self.release.reset();
        self.last = None;
    }

    pub fn effect(&self, kind: EffectKind) -> &EffectState {
        self.effects.get(kind)
    }

    pub fn effects(&self) -> &EffectBank {
        &self.effects
    }

    /// Either main gear reports weight on wheels.
    pub fn is_grounded(&self) -> bool {
        self.inputs.grounded()
    }

    pub fn last_result(&self) -> Option<&ArbitrationResult> {
        self.last.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn numeric(value: &FieldValue) -> Result<f64, ObserverError> {
    value
        .as_f64()
        .ok_or_else(|| ObserverError::type_mismatch("number", value.type_name()))
}

/// Subscribe `engine` to every configured input path on `dispatcher`.
pub fn attach(engine: &SharedEngine, dispatcher: &mut Dispatcher) -> Vec<SubscriptionId> {
    let paths: Vec<_> = {
        let guard = engine.lock();
        HapticInput::ALL
            .into_iter()
            .map(|input| (input, guard.config().inputs.path(input).clone()))
            .collect()
    };
    paths
        .into_iter()
        .map(|(input, path)| {
            let engine = Arc::clone(engine);
            dispatcher.subscribe(path, move |value: &FieldValue| {
                engine.lock().on_input(input, value)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_telemetry_core::{FieldPath, ManualClock, NullSink};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn engine() -> (HapticEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let engine = HapticEngine::with_clock(HapticConfig::default(), clock.clone());
        (engine, clock)
    }

    fn tick(engine: &mut HapticEngine) -> ArbitrationResult {
        engine.tick(&FieldSnapshot::new(), &NullSink)
    }

    #[test]
    fn test_gun_fire_first_value_is_baseline() -> TestResult {
        let (mut engine, clock) = engine();
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(578))?;
        assert_eq!(tick(&mut engine).a.raw, 0);

        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(570))?;
        assert_eq!(tick(&mut engine).a.raw, 255);
        clock.advance_ms(100);
        assert_eq!(tick(&mut engine).a.raw, 255);
        clock.advance_ms(1);
        assert_eq!(tick(&mut engine).a.raw, 0);
        Ok(())
    }

    #[test]
    fn test_reload_cancels_gun_fire() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(10))?;
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(9))?;
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(578))?;
        assert_eq!(tick(&mut engine).a.raw, 0);
        assert_eq!(engine.effect(EffectKind::GunFire).trigger_count, 1);
        Ok(())
    }

    #[test]
    fn test_replayed_ammo_keeps_gun_fire() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(10))?;
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(9))?;
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(9))?;
        assert_eq!(tick(&mut engine).a.raw, 255);
        Ok(())
    }

    #[test]
    fn test_gear_clunk_on_lock() -> TestResult {
        let (mut engine, clock) = engine();
        // Locked at first sight: baseline only.
        engine.on_input(HapticInput::NoseGearLight, &FieldValue::Int(0))?;
        assert_eq!(tick(&mut engine).a.raw, 0);

        engine.on_input(HapticInput::NoseGearLight, &FieldValue::Int(1))?;
        engine.on_input(HapticInput::NoseGearLight, &FieldValue::Int(0))?;
        assert_eq!(tick(&mut engine).a.raw, 150);
        clock.advance_ms(101);
        assert_eq!(tick(&mut engine).a.raw, 0);
        Ok(())
    }

    #[test]
    fn test_landing_impact_needs_arming_and_gear_down() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::GearPos, &FieldValue::Float(1.0))?;
        engine.on_input(HapticInput::RodLeft, &FieldValue::Float(0.5))?;
        assert_eq!(tick(&mut engine).a.raw, 0);

        engine.on_input(HapticInput::RodLeft, &FieldValue::Float(0.0))?;
        engine.on_input(HapticInput::RodRight, &FieldValue::Float(0.2))?;
        assert_eq!(tick(&mut engine).a.raw, 0);
        engine.on_input(HapticInput::RodRight, &FieldValue::Float(0.45))?;
        assert_eq!(tick(&mut engine).a.raw, 255);
        // One trigger per landing.
        engine.on_input(HapticInput::RodLeft, &FieldValue::Float(0.6))?;
        assert_eq!(engine.effect(EffectKind::LandingImpact).trigger_count, 1);

        engine.on_input(HapticInput::GearPos, &FieldValue::Float(0.5))?;
        engine.on_input(HapticInput::RodLeft, &FieldValue::Float(0.0))?;
        engine.on_input(HapticInput::RodLeft, &FieldValue::Float(0.6))?;
        assert_eq!(engine.effect(EffectKind::LandingImpact).trigger_count, 1);
        Ok(())
    }

    #[test]
    fn test_gear_transit_hum_and_gain() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::GearPos, &FieldValue::Float(0.4))?;
        let result = tick(&mut engine);
        assert_eq!(result.a, ChannelOutput { raw: 65, output: 65 });
        assert_eq!(result.b, ChannelOutput { raw: 65, output: 91 });
        assert_eq!(result.active, vec![EffectKind::GearTransit]);

        engine.on_input(HapticInput::GearPos, &FieldValue::Float(0.995))?;
        assert_eq!(tick(&mut engine).b.raw, 0);
        Ok(())
    }

    #[test]
    fn test_buffet_only_airborne_and_wobble_only_grounded() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::Aoa, &FieldValue::Float(25.0))?;
        engine.on_input(HapticInput::GForward, &FieldValue::Float(-0.425))?;
        let airborne = tick(&mut engine);
        assert_eq!(airborne.active, vec![EffectKind::AoaBuffet]);
        assert_eq!(airborne.a.raw, 150);

        engine.on_input(HapticInput::WowLeft, &FieldValue::Bool(true))?;
        let grounded = tick(&mut engine);
        assert_eq!(grounded.active, vec![EffectKind::LandingRollWobble]);
        assert_eq!(grounded.a.raw, 150);
        Ok(())
    }

    #[test]
    fn test_max_arbitration_and_routing() -> TestResult {
        let clock = Arc::new(ManualClock::new());
        let mut config = HapticConfig::default();
        config.routing = config
            .routing
            .route(EffectKind::AoaBuffet, &[MotorChannel::B]);
        let mut engine = HapticEngine::with_clock(config, clock);

        engine.on_input(HapticInput::GearPos, &FieldValue::Float(0.5))?;
        engine.on_input(HapticInput::Aoa, &FieldValue::Float(20.0))?;
        let result = tick(&mut engine);

        assert_eq!(result.a.raw, 65);
        assert_eq!(result.b.raw, 98);
        assert_eq!(result.b.output, 137);
        Ok(())
    }

    #[test]
    fn test_tick_writes_each_channel_once() {
        use parking_lot::Mutex as PlMutex;

        #[derive(Default)]
        struct Counting(PlMutex<Vec<(MotorChannel, u8)>>);
        impl OutputSink for Counting {
            fn set_discrete(&self, _id: &cockpit_telemetry_core::IndicatorId, _on: bool) {}
            fn set_level(&self, _id: &cockpit_telemetry_core::IndicatorId, _level: u8) {}
            fn set_motor(&self, channel: MotorChannel, intensity: u8) {
                self.0.lock().push((channel, intensity));
            }
        }

        let (mut engine, _clock) = engine();
        let sink = Counting::default();
        engine.tick(&FieldSnapshot::new(), &sink);
        engine.tick(&FieldSnapshot::new(), &sink);
        assert_eq!(
            sink.0.lock().as_slice(),
            &[
                (MotorChannel::A, 0),
                (MotorChannel::B, 0),
                (MotorChannel::A, 0),
                (MotorChannel::B, 0)
            ]
        );
    }

    #[test]
    fn test_type_mismatch_leaves_state() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::Aoa, &FieldValue::Float(25.0))?;
        let rejected = engine.on_input(HapticInput::Aoa, &FieldValue::from("high"));
        assert_eq!(rejected, Err(ObserverError::type_mismatch("number", "text")));
        assert_eq!(tick(&mut engine).a.raw, 150);
        Ok(())
    }

    #[test]
    fn test_reset_returns_to_baseline() -> TestResult {
        let (mut engine, _clock) = engine();
        engine.on_input(HapticInput::GearPos, &FieldValue::Float(0.5))?;
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(10))?;
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(9))?;
        assert!(tick(&mut engine).a.raw > 0);

        engine.reset();
        assert!(engine.effects().active().is_empty());
        assert!(engine.last_result().is_none());
        assert_eq!(tick(&mut engine).a.raw, 0);

        // Ammo baseline was forgotten too.
        engine.on_input(HapticInput::CannonAmmo, &FieldValue::Int(8))?;
        assert_eq!(tick(&mut engine).a.raw, 0);
        Ok(())
    }

    #[test]
    fn test_attach_routes_dispatched_fields() -> TestResult {
        let clock = Arc::new(ManualClock::new());
        let engine = HapticEngine::with_clock(HapticConfig::default(), clock).shared();
        let mut dispatcher = Dispatcher::new();
        let ids = attach(&engine, &mut dispatcher);
        assert_eq!(ids.len(), HapticInput::ALL.len());

        dispatcher.notify(&cockpit_telemetry_core::ChangeEvent::new(
            FieldPath::named("leds.GEAR_POS"),
            0.3,
        ));
        let result = engine.lock().tick(&FieldSnapshot::new(), &NullSink);
        assert_eq!(result.a.raw, 65);
        Ok(())
    }
}
