//! Flight profile rendered as structured export documents.

use opencockpit_test_helpers::fixtures::ExportDocument;

/// The fields the haptic engine and the panel tables read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    pub wow_left: i64,
    pub wow_right: i64,
    pub gear_pos: f64,
    pub nose_gear: i64,
    pub rod_left: f64,
    pub rod_right: f64,
    pub aoa: f64,
    pub g_x: f64,
    pub cannon_ammo: i64,
    pub master_caution: i64,
}

impl FlightState {
    /// Gear up, moderate angle of attack, full gun.
    pub const APPROACH: FlightState = FlightState {
        wow_left: 0,
        wow_right: 0,
        gear_pos: 0.0,
        nose_gear: 0,
        rod_left: 0.0,
        rod_right: 0.0,
        aoa: 8.0,
        g_x: 0.0,
        cannon_ammo: 578,
        master_caution: 0,
    };

    pub fn gear_in_transit(mut self) -> Self {
        self.gear_pos = 0.5;
        self.nose_gear = 1;
        self
    }

    pub fn gear_locked(mut self) -> Self {
        self.gear_pos = 1.0;
        self.nose_gear = 0;
        self
    }

    /// Both mains on the ground with the struts compressed and the brakes on.
    pub fn touchdown(mut self) -> Self {
        self.wow_left = 1;
        self.wow_right = 1;
        self.rod_left = 0.45;
        self.rod_right = 0.5;
        self.aoa = 12.0;
        self.g_x = -0.6;
        self
    }

    pub fn rolled_out(mut self) -> Self {
        self.g_x = -0.04;
        self
    }

    pub fn document(&self, aircraft: &str) -> Vec<u8> {
        ExportDocument::new()
            .aircraft(aircraft)
            .field("leds", "WOW_LEFT", self.wow_left)
            .field("leds", "WOW_RIGHT", self.wow_right)
            .field("leds", "GEAR_POS", self.gear_pos)
            .field("leds", "NOSE_GEAR", self.nose_gear)
            .field("leds", "ROD_LEFT", self.rod_left)
            .field("leds", "ROD_RIGHT", self.rod_right)
            .field("leds", "MASTER_CAUTION", self.master_caution)
            .field("flight", "aoa", self.aoa)
            .field("flight", "g_x", self.g_x)
            .field("payload", "cannon_ammo", self.cannon_ammo)
            .to_bytes()
    }
}
