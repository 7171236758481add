//! Clamped linear intensity curves for continuous effects.

use crate::constants::{
    AOA_CAP_DEG, AOA_ONSET_DEG, RAMP_MAX_INTENSITY, RAMP_MIN_INTENSITY, WOBBLE_CAP_G,
    WOBBLE_ONSET_G,
};
use serde::{Deserialize, Serialize};

/// Maps an input above `onset` linearly onto `min..=max`, saturating at `cap`.
///
/// # Examples
///
/// ```
/// use opencockpit_haptics::IntensityRamp;
///
/// let buffet = IntensityRamp::AOA_BUFFET;
/// assert_eq!(buffet.evaluate(10.0), None);
/// assert_eq!(buffet.evaluate(15.0), None);
/// assert_eq!(buffet.evaluate(25.0), Some(150));
/// assert_eq!(buffet.evaluate(90.0), Some(255));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityRamp {
    /// Input at or below which the effect is inactive.
    pub onset: f64,
    /// Input at which `max` is reached.
    pub cap: f64,
    pub min: u8,
    pub max: u8,
}

impl IntensityRamp {
    /// Angle-of-attack buffet: 15° to 35° maps to 45..=255.
    pub const AOA_BUFFET: IntensityRamp = IntensityRamp {
        onset: AOA_ONSET_DEG,
        cap: AOA_CAP_DEG,
        min: RAMP_MIN_INTENSITY,
        max: RAMP_MAX_INTENSITY,
    };

    /// Landing roll wobble: 0.05 g to 0.8 g maps to 45..=255.
    pub const LANDING_ROLL: IntensityRamp = IntensityRamp {
        onset: WOBBLE_ONSET_G,
        cap: WOBBLE_CAP_G,
        min: RAMP_MIN_INTENSITY,
        max: RAMP_MAX_INTENSITY,
    };

    pub fn new(onset: f64, cap: f64, min: u8, max: u8) -> Self {
        Self {
            onset,
            cap,
            min,
            max,
        }
    }

    /// Intensity for `input`, or `None` when the input does not exceed the
    /// onset (including NaN). Halfway values round to even.
    pub fn evaluate(&self, input: f64) -> Option<u8> {
        if input.is_nan() || input <= self.onset {
            return None;
        }
        let span = self.cap - self.onset;
        let fraction = if span > 0.0 {
            ((input.min(self.cap) - self.onset) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let low = f64::from(self.min);
        let high = f64::from(self.max);
        let value = (low + fraction * (high - low)).round_ties_even();
        Some(value.clamp(0.0, 255.0) as u8)
    }
}
