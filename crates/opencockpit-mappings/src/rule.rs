//! One field driving one output.

use cockpit_telemetry_core::{BitField, FieldPath, FieldValue, IndicatorId, OutputSink};
use opencockpit_errors::ObserverError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output-ready form of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Flag(bool),
    Level(u8),
}

impl Signal {
    /// A non-zero level counts as on.
    pub fn is_on(self) -> bool {
        match self {
            Signal::Flag(on) => on,
            Signal::Level(level) => level > 0,
        }
    }

    /// A flag is full or zero brightness.
    pub fn level(self) -> u8 {
        match self {
            Signal::Flag(true) => u8::MAX,
            Signal::Flag(false) => 0,
            Signal::Level(level) => level,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Flag(on) => write!(f, "{}", if *on { "on" } else { "off" }),
            Signal::Level(level) => write!(f, "{level}"),
        }
    }
}

/// Conversion from a field value to a [`Signal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Non-zero numbers, `true` and non-empty text are on.
    #[default]
    Truthy,
    /// `max(floor, trunc(value * factor))`, clamped to 0..=255.
    Scale {
        factor: f64,
        #[serde(default)]
        floor: u8,
    },
    /// The numeric value clamped to 0..=255.
    Identity,
}

impl Transform {
    /// Full 16-bit register range onto 0..=255.
    pub const REGISTER_BRIGHTNESS: Transform = Transform::Scale {
        factor: 255.0 / 65535.0,
        floor: 0,
    };

    /// Backlight knob in 0.0..=1.0 with a minimum glow.
    ///
    /// ```
    /// use cockpit_telemetry_core::FieldValue;
    /// use opencockpit_mappings::{Signal, Transform};
    ///
    /// let knob = Transform::unit_brightness(13);
    /// assert_eq!(knob.apply(&FieldValue::Float(0.5)), Ok(Signal::Level(127)));
    /// assert_eq!(knob.apply(&FieldValue::Float(0.0)), Ok(Signal::Level(13)));
    /// ```
    pub fn unit_brightness(floor: u8) -> Transform {
        Transform::Scale {
            factor: 255.0,
            floor,
        }
    }

    pub fn apply(&self, value: &FieldValue) -> Result<Signal, ObserverError> {
        match self {
            Transform::Truthy => Ok(Signal::Flag(value.as_bool())),
            Transform::Scale { factor, floor } => {
                let level = to_level(numeric(value)? * factor);
                Ok(Signal::Level(level.max(*floor)))
            }
            Transform::Identity => Ok(Signal::Level(to_level(numeric(value)?))),
        }
    }
}

fn numeric(value: &FieldValue) -> Result<f64, ObserverError> {
    value
        .as_f64()
        .ok_or_else(|| ObserverError::type_mismatch("number", value.type_name()))
}

fn to_level(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).trunc() as u8
}

/// Output written for a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// On/off indicator.
    Discrete(IndicatorId),
    /// Variable-brightness indicator.
    Level(IndicatorId),
    /// Variable-brightness indicator driven at one of two fixed levels.
    Switched {
        target: IndicatorId,
        #[serde(default = "full_level")]
        on: u8,
        #[serde(default)]
        off: u8,
    },
}

fn full_level() -> u8 {
    u8::MAX
}

impl Action {
    pub fn target(&self) -> &IndicatorId {
        match self {
            Action::Discrete(id) | Action::Level(id) => id,
            Action::Switched { target, .. } => target,
        }
    }

    pub fn perform(&self, signal: Signal, sink: &dyn OutputSink) {
        match self {
            Action::Discrete(id) => sink.set_discrete(id, signal.is_on()),
            Action::Level(id) => sink.set_level(id, signal.level()),
            Action::Switched { target, on, off } => {
                sink.set_level(target, if signal.is_on() { *on } else { *off });
            }
        }
    }

    /// Drive the target to its dark state.
    pub fn quiesce(&self, sink: &dyn OutputSink) {
        match self {
            Action::Discrete(id) => sink.set_discrete(id, false),
            Action::Level(id) | Action::Switched { target: id, .. } => sink.set_level(id, 0),
        }
    }
}

/// A field path, an optional register bit-field, a transform and an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingRule {
    pub path: FieldPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<BitField>,
    #[serde(default)]
    pub transform: Transform,
    pub action: Action,
    #[serde(default)]
    pub description: String,
}

impl MappingRule {
    pub fn new(path: impl Into<FieldPath>, transform: Transform, action: Action) -> Self {
        Self {
            path: path.into(),
            bits: None,
            transform,
            action,
            description: String::new(),
        }
    }

    pub fn with_bits(mut self, bits: BitField) -> Self {
        self.bits = Some(bits);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Label used in logs: the description, or the path if there is none.
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.path.to_string()
        } else {
            self.description.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencockpit_test_helpers::prelude::*;

    #[test]
    fn test_truthy_follows_field_truthiness() {
        let t = Transform::Truthy;
        assert_eq!(t.apply(&FieldValue::Int(0)), Ok(Signal::Flag(false)));
        assert_eq!(t.apply(&FieldValue::Int(3)), Ok(Signal::Flag(true)));
        assert_eq!(t.apply(&FieldValue::from("")), Ok(Signal::Flag(false)));
    }

    #[test]
    fn test_register_brightness_spans_full_range() {
        let t = Transform::REGISTER_BRIGHTNESS;
        assert_eq!(t.apply(&FieldValue::Int(0)), Ok(Signal::Level(0)));
        assert_eq!(t.apply(&FieldValue::Int(65535)), Ok(Signal::Level(255)));
        assert_eq!(t.apply(&FieldValue::Int(32768)), Ok(Signal::Level(127)));
    }

    #[test]
    fn test_scale_clamps_and_rejects_text() {
        let t = Transform::unit_brightness(3);
        assert_eq!(t.apply(&FieldValue::Float(4.0)), Ok(Signal::Level(255)));
        assert_eq!(t.apply(&FieldValue::Float(-1.0)), Ok(Signal::Level(3)));
        assert_eq!(
            t.apply(&FieldValue::from("bright")),
            Err(ObserverError::type_mismatch("number", "text"))
        );
    }

    #[test]
    fn test_identity_truncates() {
        assert_eq!(
            Transform::Identity.apply(&FieldValue::Float(99.9)),
            Ok(Signal::Level(99))
        );
        assert_eq!(
            Transform::Identity.apply(&FieldValue::Int(300)),
            Ok(Signal::Level(255))
        );
    }

    #[test]
    fn test_switched_uses_fixed_levels() {
        let sink = RecordingSink::new();
        let handle = IndicatorId::new("pto2", 6);
        let action = Action::Switched {
            target: handle.clone(),
            on: 200,
            off: 10,
        };
        action.perform(Signal::Flag(true), &sink);
        assert_eq!(sink.last_level(&handle), Some(200));
        action.perform(Signal::Level(0), &sink);
        assert_eq!(sink.last_level(&handle), Some(10));
        action.quiesce(&sink);
        assert_eq!(sink.last_level(&handle), Some(0));
    }

    #[test]
    fn test_discrete_from_level_signal() {
        let sink = RecordingSink::new();
        let lamp = IndicatorId::new("ufc", 1);
        Action::Discrete(lamp.clone()).perform(Signal::Level(40), &sink);
        assert_eq!(sink.last_discrete(&lamp), Some(true));
    }

    #[test]
    fn test_rule_yaml_shape() -> TestResult {
        let rule: MappingRule = serde_yaml::from_str(
            r#"
path: "0x7408"
bits: { mask: 0x0800, shift: 11 }
action:
  discrete: { device: pto2, index: 3 }
description: Master caution
"#,
        )?;
        assert_eq!(rule.path, FieldPath::address(0x7408));
        assert_eq!(rule.bits, Some(BitField::new(0x0800, 11)));
        assert_eq!(rule.transform, Transform::Truthy);
        assert_eq!(rule.label(), "Master caution");
        Ok(())
    }

    #[test]
    fn test_rule_yaml_rejects_unknown_keys() {
        let parsed: Result<MappingRule, _> = serde_yaml::from_str(
            "path: leds.HOOK\naction: { discrete: { device: pto2, index: 9 } }\ncolour: red\n",
        );
        assert!(parsed.ok().is_none());
    }
}
