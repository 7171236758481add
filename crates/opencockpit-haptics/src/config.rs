//! Engine configuration: input paths, channel gains, routing and the
//! release detector's naming convention and weight table.
//!
//! Every section carries `#[serde(default)]`, so a partial YAML document is
//! valid and anything omitted keeps the built-in value.

use crate::constants::{DEFAULT_GAIN_A, DEFAULT_GAIN_B, DEFAULT_RELEASE_INTENSITY};
use crate::effects::EffectKind;
use cockpit_telemetry_core::{FieldPath, MotorChannel};
use opencockpit_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A telemetry field the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticInput {
    /// Remaining cannon rounds
    CannonAmmo,
    /// Left main gear weight-on-wheels
    WowLeft,
    /// Right main gear weight-on-wheels
    WowRight,
    /// Normalized gear position, 0 = up, 1 = down
    GearPos,
    /// Gear transit light: on while moving, off once locked
    NoseGearLight,
    /// Left main strut compression
    RodLeft,
    /// Right main strut compression
    RodRight,
    /// Angle of attack in degrees
    Aoa,
    /// Longitudinal acceleration in g
    GForward,
}

impl HapticInput {
    pub const ALL: [HapticInput; 9] = [
        HapticInput::CannonAmmo,
        HapticInput::WowLeft,
        HapticInput::WowRight,
        HapticInput::GearPos,
        HapticInput::NoseGearLight,
        HapticInput::RodLeft,
        HapticInput::RodRight,
        HapticInput::Aoa,
        HapticInput::GForward,
    ];
}

impl fmt::Display for HapticInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HapticInput::CannonAmmo => "cannon_ammo",
            HapticInput::WowLeft => "wow_left",
            HapticInput::WowRight => "wow_right",
            HapticInput::GearPos => "gear_pos",
            HapticInput::NoseGearLight => "nose_gear_light",
            HapticInput::RodLeft => "rod_left",
            HapticInput::RodRight => "rod_right",
            HapticInput::Aoa => "aoa",
            HapticInput::GForward => "g_forward",
        };
        f.write_str(name)
    }
}

/// Field path bound to each [`HapticInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub cannon_ammo: FieldPath,
    pub wow_left: FieldPath,
    pub wow_right: FieldPath,
    pub gear_pos: FieldPath,
    pub nose_gear_light: FieldPath,
    pub rod_left: FieldPath,
    pub rod_right: FieldPath,
    pub aoa: FieldPath,
    pub g_forward: FieldPath,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            cannon_ammo: FieldPath::named("payload.cannon_ammo"),
            wow_left: FieldPath::named("leds.WOW_LEFT"),
            wow_right: FieldPath::named("leds.WOW_RIGHT"),
            gear_pos: FieldPath::named("leds.GEAR_POS"),
            nose_gear_light: FieldPath::named("leds.NOSE_GEAR"),
            rod_left: FieldPath::named("leds.ROD_LEFT"),
            rod_right: FieldPath::named("leds.ROD_RIGHT"),
            aoa: FieldPath::named("flight.aoa"),
            g_forward: FieldPath::named("flight.g_x"),
        }
    }
}

impl InputPaths {
    pub fn path(&self, input: HapticInput) -> &FieldPath {
        match input {
            HapticInput::CannonAmmo => &self.cannon_ammo,
            HapticInput::WowLeft => &self.wow_left,
            HapticInput::WowRight => &self.wow_right,
            HapticInput::GearPos => &self.gear_pos,
            HapticInput::NoseGearLight => &self.nose_gear_light,
            HapticInput::RodLeft => &self.rod_left,
            HapticInput::RodRight => &self.rod_right,
            HapticInput::Aoa => &self.aoa,
            HapticInput::GForward => &self.g_forward,
        }
    }
}

/// Multiplicative gain per motor channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelGains {
    pub a: f64,
    pub b: f64,
}

impl Default for ChannelGains {
    fn default() -> Self {
        Self {
            a: DEFAULT_GAIN_A,
            b: DEFAULT_GAIN_B,
        }
    }
}

impl ChannelGains {
    pub fn gain(&self, channel: MotorChannel) -> f64 {
        match channel {
            MotorChannel::A => self.a,
            MotorChannel::B => self.b,
        }
    }

    /// `min(255, trunc(raw * gain))`; negative and NaN products give 0.
    ///
    /// ```
    /// use cockpit_telemetry_core::MotorChannel;
    /// use opencockpit_haptics::ChannelGains;
    ///
    /// let gains = ChannelGains::default();
    /// assert_eq!(gains.apply(MotorChannel::A, 150), 150);
    /// assert_eq!(gains.apply(MotorChannel::B, 150), 210);
    /// assert_eq!(gains.apply(MotorChannel::B, 200), 255);
    /// ```
    pub fn apply(&self, channel: MotorChannel, raw: u8) -> u8 {
        let scaled = f64::from(raw) * self.gain(channel);
        if scaled.is_nan() {
            return 0;
        }
        scaled.clamp(0.0, 255.0).trunc() as u8
    }
}

/// Channels each effect drives. Effects without an entry drive both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectRouting(BTreeMap<EffectKind, Vec<MotorChannel>>);

impl EffectRouting {
    pub fn route(mut self, kind: EffectKind, channels: &[MotorChannel]) -> Self {
        self.0.insert(kind, channels.to_vec());
        self
    }

    pub fn channels(&self, kind: EffectKind) -> &[MotorChannel] {
        self.0
            .get(&kind)
            .map_or(&MotorChannel::ALL[..], Vec::as_slice)
    }

    pub fn drives(&self, kind: EffectKind, channel: MotorChannel) -> bool {
        self.channels(kind).contains(&channel)
    }
}

/// How stores are found in the per-unit snapshot and how heavy they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Section holding the station fields.
    pub section: String,
    /// Suffix of per-station store counters, e.g. `station_3_count`.
    pub count_suffix: String,
    /// Suffix of the matching store identifier, e.g. `station_3_clsid`.
    pub identifier_suffix: String,
    /// Intensity used when the identifier is not in `weights`.
    pub default_intensity: u8,
    /// Store identifier to weight in kilograms.
    pub weights: BTreeMap<String, f64>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            section: "payload".to_string(),
            count_suffix: "_count".to_string(),
            identifier_suffix: "_clsid".to_string(),
            default_intensity: DEFAULT_RELEASE_INTENSITY,
            weights: default_weight_table(),
        }
    }
}

impl ReleaseConfig {
    pub fn weight(&self, identifier: &str) -> Option<f64> {
        self.weights.get(identifier).copied()
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    pub inputs: InputPaths,
    pub gains: ChannelGains,
    pub routing: EffectRouting,
    pub release: ReleaseConfig,
}

impl HapticConfig {
    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, gain) in [("haptics.gains.a", self.gains.a), ("haptics.gains.b", self.gains.b)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("gain must be finite and non-negative, got {gain}"),
                ));
            }
        }
        if self.release.count_suffix.is_empty() {
            return Err(ConfigError::invalid(
                "haptics.release.count_suffix",
                "must not be empty",
            ));
        }
        if self.release.identifier_suffix == self.release.count_suffix {
            return Err(ConfigError::invalid(
                "haptics.release.identifier_suffix",
                "must differ from count_suffix",
            ));
        }
        if let Some((id, weight)) = self
            .release
            .weights
            .iter()
            .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
        {
            return Err(ConfigError::invalid(
                format!("haptics.release.weights.{id}"),
                format!("weight must be finite and non-negative, got {weight}"),
            ));
        }
        Ok(())
    }
}

/// Store weights (kg) keyed by the simulator's store identifier.
pub fn default_weight_table() -> BTreeMap<String, f64> {
    [
        // Air-to-air
        ("{6CEB49FC-DED8-4DED-B053-E1F033FF72D3}", 86.0), // AIM-9M
        ("{5CE2FF2A-645A-4197-B48D-8720AC69394F}", 84.0), // AIM-9X
        ("{8D399DDA-FF81-4F14-904D-099B34FE7918}", 231.0), // AIM-7M
        ("{AIM-7F}", 231.0),
        ("{AIM-7H}", 231.0),
        ("{C8E06185-7CD6-4C90-959F-044679E90751}", 158.0), // AIM-120B
        ("{40EF17B7-F508-45de-8566-6FFECC0C1AB8}", 161.0), // AIM-120C
        // Air-to-ground
        ("{F16A4DE0-116C-4A71-97F0-2CF85B0313EF}", 286.0), // AGM-65E
        ("{B06DD79A-F21E-4EB9-BD9D-AB3844618C9C}", 361.0), // AGM-88C
        ("{AGM_84D}", 540.0),
        ("{AGM_84H}", 675.0),
        ("{AGM-154A}", 485.0),
        ("{9BCC2A2B-5708-4860-B1F1-053A18442067}", 484.0), // AGM-154C
        // Bombs
        ("{BCE4E030-38E9-423E-98ED-24BE3DA87C32}", 232.0), // Mk-82
        ("{Mk-83}", 454.0),
        ("{AB8B8299-F1CC-4571-9571-6C22BCA83BFF}", 894.0), // Mk-84
        ("{51F9AAE5-964F-4D21-83FB-502E3BFE5F8A}", 1162.0), // GBU-10
        ("{DB769D48-67D7-42ED-A2BE-108D566C8B1E}", 275.0), // GBU-12
        ("{0D33DDAE-524F-4A4E-B5B8-621754FE3ADE}", 564.0), // GBU-16
        ("{GBU-31}", 934.0),
        ("{GBU-31V3B}", 934.0),
        ("{GBU-38}", 253.0),
        ("{CBU-87}", 430.0),
        ("{5335D97A-35A5-4643-9D9B-026C75961E52}", 417.0), // CBU-97
        ("{CBU_99}", 222.0),
        // Tanks, empty weight
        ("{FPU_8A_FUEL_TANK}", 520.0),
        ("{E8D4652F-FD48-45B7-BA5B-2AE05BB5A9CF}", 525.0), // PTB-800
    ]
    .into_iter()
    .map(|(id, kg)| (id.to_string(), kg))
    .collect()
}
