//! Effect identities and per-effect state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// One independently modelled haptic phenomenon.
///
/// # Examples
///
/// ```
/// use opencockpit_haptics::EffectKind;
///
/// assert_eq!(EffectKind::ALL.len(), 7);
/// assert!(EffectKind::GunFire.is_pulse());
/// assert!(!EffectKind::AoaBuffet.is_pulse());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    GunFire,
    WeaponRelease,
    LandingImpact,
    GearClunk,
    GearTransit,
    AoaBuffet,
    LandingRollWobble,
}

impl EffectKind {
    pub const ALL: [EffectKind; 7] = [
        EffectKind::GunFire,
        EffectKind::WeaponRelease,
        EffectKind::LandingImpact,
        EffectKind::GearClunk,
        EffectKind::GearTransit,
        EffectKind::AoaBuffet,
        EffectKind::LandingRollWobble,
    ];

    /// Time-bounded effects started by a discrete trigger.
    pub fn is_pulse(&self) -> bool {
        matches!(
            self,
            EffectKind::GunFire
                | EffectKind::WeaponRelease
                | EffectKind::LandingImpact
                | EffectKind::GearClunk
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::GunFire => "gun_fire",
            EffectKind::WeaponRelease => "weapon_release",
            EffectKind::LandingImpact => "landing_impact",
            EffectKind::GearClunk => "gear_clunk",
            EffectKind::GearTransit => "gear_transit",
            EffectKind::AoaBuffet => "aoa_buffet",
            EffectKind::LandingRollWobble => "landing_roll_wobble",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a single effect.
///
/// Pulse effects carry an activation instant and a duration; continuous
/// effects only carry `active` and `intensity`, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectState {
    pub active: bool,
    pub intensity: u8,
    pub activated_at: Option<Instant>,
    pub duration: Option<Duration>,
    /// Activations since the last reset: every pulse trigger, and every
    /// inactive to active edge of a continuous effect.
    pub trigger_count: u64,
}

impl EffectState {
    /// Start (or restart) a pulse. Re-triggering while active moves the
    /// activation time forward and replaces the intensity; it never adds to it.
    pub fn trigger(&mut self, now: Instant, intensity: u8, duration: Duration) {
        self.active = true;
        self.intensity = intensity;
        self.activated_at = Some(now);
        self.duration = Some(duration);
        self.trigger_count = self.trigger_count.saturating_add(1);
    }

    /// Deactivate a pulse once strictly more than its duration has elapsed.
    /// Returns `true` if the effect expired on this call.
    pub fn expire(&mut self, now: Instant) -> bool {
        let (Some(at), Some(duration)) = (self.activated_at, self.duration) else {
            return false;
        };
        if self.active && now.saturating_duration_since(at) > duration {
            self.active = false;
            self.intensity = 0;
            return true;
        }
        false
    }

    /// Drive a continuous effect: `Some(intensity)` while its condition holds.
    pub fn set_continuous(&mut self, level: Option<u8>) {
        match level {
            Some(intensity) => {
                if !self.active {
                    self.trigger_count = self.trigger_count.saturating_add(1);
                }
                self.active = true;
                self.intensity = intensity;
            }
            None => {
                self.active = false;
                self.intensity = 0;
            }
        }
    }

    /// Stop without waiting for the duration to elapse.
    pub fn cancel(&mut self) {
        self.active = false;
        self.intensity = 0;
    }

    /// Current contribution to arbitration.
    pub fn level(&self) -> u8 {
        if self.active { self.intensity } else { 0 }
    }
}

/// Fixed set of effect states, one per [`EffectKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectBank {
    gun_fire: EffectState,
    weapon_release: EffectState,
    landing_impact: EffectState,
    gear_clunk: EffectState,
    gear_transit: EffectState,
    aoa_buffet: EffectState,
    landing_roll_wobble: EffectState,
}

impl EffectBank {
    pub fn get(&self, kind: EffectKind) -> &EffectState {
        match kind {
            EffectKind::GunFire => &self.gun_fire,
            EffectKind::WeaponRelease => &self.weapon_release,
            EffectKind::LandingImpact => &self.landing_impact,
            EffectKind::GearClunk => &self.gear_clunk,
            EffectKind::GearTransit => &self.gear_transit,
            EffectKind::AoaBuffet => &self.aoa_buffet,
            EffectKind::LandingRollWobble => &self.landing_roll_wobble,
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut EffectState {
        match kind {
            EffectKind::GunFire => &mut self.gun_fire,
            EffectKind::WeaponRelease => &mut self.weapon_release,
            EffectKind::LandingImpact => &mut self.landing_impact,
            EffectKind::GearClunk => &mut self.gear_clunk,
            EffectKind::GearTransit => &mut self.gear_transit,
            EffectKind::AoaBuffet => &mut self.aoa_buffet,
            EffectKind::LandingRollWobble => &mut self.landing_roll_wobble,
        }
    }

    /// Kinds currently contributing a non-zero level.
    pub fn active(&self) -> Vec<EffectKind> {
        EffectKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).level() > 0)
            .collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
