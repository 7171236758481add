//! Effect intensities, durations and thresholds

use std::time::Duration;

/// Cannon round fired
pub const GUN_FIRE_INTENSITY: u8 = 255;
pub const GUN_FIRE_DURATION: Duration = Duration::from_millis(100);

/// Store released (intensity comes from the weight table)
pub const WEAPON_RELEASE_DURATION: Duration = Duration::from_millis(100);

/// Fallback release intensity for identifiers missing from the weight table
pub const DEFAULT_RELEASE_INTENSITY: u8 = 220;

/// Main gear strut loaded on touchdown
pub const LANDING_IMPACT_INTENSITY: u8 = 255;
pub const LANDING_IMPACT_DURATION: Duration = Duration::from_millis(150);

/// Strut compression below which the gear counts as unloaded
pub const ROD_UNLOADED: f64 = 0.05;

/// Strut compression above which an armed gear counts as touched down
pub const ROD_COMPRESSED: f64 = 0.3;

/// Gear position above which the gear counts as down and locked
pub const GEAR_DOWN_POSITION: f64 = 0.99;

/// Gear lock clunk
pub const GEAR_CLUNK_INTENSITY: u8 = 150;
pub const GEAR_CLUNK_DURATION: Duration = Duration::from_millis(100);

/// Hydraulic hum while the gear is moving
pub const GEAR_TRANSIT_INTENSITY: u8 = 65;
pub const GEAR_TRANSIT_LOWER: f64 = 0.01;
pub const GEAR_TRANSIT_UPPER: f64 = 0.99;

/// Buffet onset and cap (degrees angle of attack)
pub const AOA_ONSET_DEG: f64 = 15.0;
pub const AOA_CAP_DEG: f64 = 35.0;

/// Landing roll wobble noise floor and cap (g)
pub const WOBBLE_ONSET_G: f64 = 0.05;
pub const WOBBLE_CAP_G: f64 = 0.8;

/// Intensity range of the continuous ramps
pub const RAMP_MIN_INTENSITY: u8 = 45;
pub const RAMP_MAX_INTENSITY: u8 = 255;

/// Channel gains. Channel B drives the weaker transducer.
pub const DEFAULT_GAIN_A: f64 = 1.0;
pub const DEFAULT_GAIN_B: f64 = 1.4;

/// Map a released store's weight to a motor intensity.
///
/// # Examples
///
/// ```
/// use opencockpit_haptics::weight_to_intensity;
///
/// assert_eq!(weight_to_intensity(86.0), 160);   // AIM-9M
/// assert_eq!(weight_to_intensity(232.0), 210);  // Mk-82
/// assert_eq!(weight_to_intensity(454.0), 240);  // Mk-83
/// assert_eq!(weight_to_intensity(894.0), 255);  // Mk-84
/// ```
pub fn weight_to_intensity(weight_kg: f64) -> u8 {
    if weight_kg < 150.0 {
        160
    } else if weight_kg < 400.0 {
        210
    } else if weight_kg < 700.0 {
        240
    } else {
        255
    }
}
