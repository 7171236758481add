//! Field paths, scalar values and bit-field extraction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Stable key identifying one logical telemetry field.
///
/// The binary protocol addresses 16-bit registers by memory address; the
/// structured protocol names fields as `"section.leaf"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldPath {
    Address(u16),
    Named(Arc<str>),
}

impl FieldPath {
    pub fn address(address: u16) -> Self {
        FieldPath::Address(address)
    }

    pub fn named(name: impl AsRef<str>) -> Self {
        FieldPath::Named(Arc::from(name.as_ref()))
    }

    /// Build `"section.leaf"`.
    pub fn section_leaf(section: &str, leaf: &str) -> Self {
        FieldPath::Named(Arc::from(format!("{section}.{leaf}")))
    }

    pub fn as_address(&self) -> Option<u16> {
        match self {
            FieldPath::Address(address) => Some(*address),
            FieldPath::Named(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            FieldPath::Named(name) => Some(name.as_ref()),
            FieldPath::Address(_) => None,
        }
    }

    /// Leading section of a named path (`"payload"` for `"payload.gun_ammo"`).
    pub fn section(&self) -> Option<&str> {
        self.as_name()
            .map(|name| name.split_once('.').map_or(name, |(section, _)| section))
    }

    /// Trailing leaf of a named path (`"gun_ammo"` for `"payload.gun_ammo"`).
    pub fn leaf(&self) -> Option<&str> {
        self.as_name()
            .map(|name| name.rsplit_once('.').map_or(name, |(_, leaf)| leaf))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Address(address) => write!(f, "0x{address:04X}"),
            FieldPath::Named(name) => f.write_str(name),
        }
    }
}

/// Rejected textual field path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path '{0}'")]
pub struct InvalidFieldPath(pub String);

impl FromStr for FieldPath {
    type Err = InvalidFieldPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidFieldPath(s.to_string()));
        }
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"));
        match hex {
            Some(digits) => u16::from_str_radix(digits, 16)
                .map(FieldPath::Address)
                .map_err(|_parse| InvalidFieldPath(s.to_string())),
            None => Ok(FieldPath::named(trimmed)),
        }
    }
}

impl TryFrom<String> for FieldPath {
    type Error = InvalidFieldPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl From<u16> for FieldPath {
    fn from(address: u16) -> Self {
        FieldPath::Address(address)
    }
}

impl From<&str> for FieldPath {
    fn from(name: &str) -> Self {
        FieldPath::named(name)
    }
}

/// Scalar value carried by a change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Value equality used for change suppression.
    ///
    /// Numbers compare by value regardless of representation, so `1` and
    /// `1.0` are the same; booleans compare equal to `0`/`1`. Floats use IEEE
    /// equality: `-0.0` equals `0.0` and NaN equals nothing.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        use FieldValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => float_eq(*a, *b),
            (Int(a), Float(b)) | (Float(b), Int(a)) => float_eq(*a as f64, *b),
            (Bool(a), Bool(b)) => a == b,
            (Bool(a), Int(b)) | (Int(b), Bool(a)) => i64::from(*a) == *b,
            (Bool(a), Float(b)) | (Float(b), Bool(a)) => float_eq(f64::from(u8::from(*a)), *b),
            (Text(a), Text(b)) => a == b,
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Bool(v) => Some(f64::from(u8::from(*v))),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Integer view; floats are truncated toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            FieldValue::Float(_) => None,
            FieldValue::Bool(v) => Some(i64::from(*v)),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Truthiness: non-zero numbers, `true`, and non-empty text.
    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Bool(v) => *v,
            FieldValue::Int(v) => *v != 0,
            FieldValue::Float(v) => *v != 0.0 && !v.is_nan(),
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
        }
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a.partial_cmp(&b).is_some_and(Ordering::is_eq)
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// Sub-register selection for the binary protocol: `(raw & mask) >> shift`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitField {
    pub mask: u16,
    #[serde(default)]
    pub shift: u8,
}

impl BitField {
    pub const FULL: BitField = BitField {
        mask: 0xFFFF,
        shift: 0,
    };

    pub fn new(mask: u16, shift: u8) -> Self {
        Self { mask, shift }
    }

    pub fn extract(&self, raw: u16) -> u16 {
        (raw & self.mask)
            .checked_shr(u32::from(self.shift))
            .unwrap_or(0)
    }

    /// Apply to a dispatched value. Values outside the 16-bit register range
    /// are not registers and yield `None`.
    pub fn apply(&self, value: &FieldValue) -> Option<FieldValue> {
        let raw = value.as_i64().and_then(|v| u16::try_from(v).ok())?;
        Some(FieldValue::from(self.extract(raw)))
    }
}
