//! Address table: writable attribute name to register address and scaling.

use serde::Serialize;

/// First address of the control/status register space. A register block
/// whose header cell equals this value is addressed from here.
pub const CONTROL_BASE: u16 = 0x1000;

/// Register addresses shared by the register sub-decoder and the encoder.
pub mod register {
    use super::CONTROL_BASE;

    /// Packed hardware / software version byte pair.
    pub const VERSION: u16 = 0x0000;
    pub const CURRENT_TEMPERATURE: u16 = 0x0002;
    pub const SET_TEMPERATURE: u16 = 0x0004;
    pub const WORK_MODE: u16 = 0x0005;
    pub const FAN_SPEED: u16 = 0x0006;

    pub const POWER: u16 = CONTROL_BASE;
    pub const LOCK: u16 = CONTROL_BASE + 1;
    pub const REBOOT: u16 = CONTROL_BASE + 2;
    pub const SIGNAL_STRENGTH: u16 = CONTROL_BASE + 3;
}

/// How one writable attribute maps onto a holding register.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AddressRule {
    pub name: &'static str,
    pub address: u16,
    /// Multiplier from attribute units to register units.
    pub multiplier: f64,
    /// Valid range in attribute units.
    pub min: f64,
    pub max: f64,
    /// Register holds a two's complement value.
    pub signed: bool,
}

/// Register value produced from an attribute value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    pub register: u16,
    /// Set when the input was outside the valid range.
    pub clamped_to: Option<f64>,
}

impl AddressRule {
    const fn new(name: &'static str, address: u16, min: f64, max: f64) -> Self {
        Self {
            name,
            address,
            multiplier: 1.0,
            min,
            max,
            signed: false,
        }
    }

    const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Clamp `value` to the valid range, scale it and round to the nearest
    /// register unit.
    pub fn scale(&self, value: f64) -> Scaled {
        let clamped = value.clamp(self.min, self.max);
        let clamped_to = (clamped != value).then_some(clamped);
        let raw = (clamped * self.multiplier).round() as i64;
        let register = if self.signed {
            raw.clamp(i16::MIN as i64, i16::MAX as i64) as i16 as u16
        } else {
            raw.clamp(0, u16::MAX as i64) as u16
        };
        Scaled {
            register,
            clamped_to,
        }
    }

    /// Attribute value a register holds (inverse of [`scale`](Self::scale)
    /// up to rounding).
    pub fn unscale(&self, register: u16) -> f64 {
        let raw = if self.signed {
            register as i16 as f64
        } else {
            register as f64
        };
        raw / self.multiplier
    }
}

/// Writable attributes, sorted by name.
pub static ADDRESS_RULES: &[AddressRule] = &[
    AddressRule::new("fanSpeed", register::FAN_SPEED, 0.0, 3.0),
    AddressRule::new("lock", register::LOCK, 0.0, 1.0),
    AddressRule::new("power", register::POWER, 0.0, 1.0),
    AddressRule::new("reboot", register::REBOOT, 0.0, 1.0),
    AddressRule::new("setTemperature", register::SET_TEMPERATURE, -20.0, 50.0)
        .with_multiplier(100.0)
        .signed(),
    AddressRule::new("workMode", register::WORK_MODE, 0.0, 4.0),
];

/// Look up the address rule for a writable attribute.
pub fn lookup(name: &str) -> Option<&'static AddressRule> {
    ADDRESS_RULES
        .binary_search_by(|rule| rule.name.cmp(name))
        .ok()
        .map(|idx| &ADDRESS_RULES[idx])
}
