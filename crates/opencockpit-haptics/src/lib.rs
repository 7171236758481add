//! Haptic effect arbitration for OpenCockpit
//!
//! Seven effects (gun fire, store release, landing impact, gear clunk, gear
//! transit, angle-of-attack buffet and landing roll wobble) run as
//! independent state machines. Each tick the engine takes the maximum level
//! of the effects routed to a motor channel, applies that channel's gain and
//! writes one command per channel to the output sink.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod constants;
pub mod effects;
pub mod engine;
pub mod ramp;
pub mod release;

pub use config::{
    ChannelGains, EffectRouting, HapticConfig, HapticInput, InputPaths, ReleaseConfig,
    default_weight_table,
};
pub use constants::*;
pub use effects::{EffectBank, EffectKind, EffectState};
pub use engine::{ArbitrationResult, ChannelOutput, HapticEngine, SharedEngine, attach};
pub use ramp::IntensityRamp;
pub use release::{ReleaseDetector, ReleaseEvent};
