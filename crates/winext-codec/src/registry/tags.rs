//! Tag registry: how each uplink tag's value is laid out and what it means.

use serde::Serialize;

/// Width of a tag's value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthClass {
    Fixed1,
    Fixed2,
    Fixed4,
    /// ASCII text up to a zero byte or the end of the buffer.
    NulTerminated,
    /// One length byte followed by that many bytes.
    LengthPrefixed,
}

impl WidthClass {
    /// Width in bytes for fixed-width classes.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::Fixed1 => Some(1),
            Self::Fixed2 => Some(2),
            Self::Fixed4 => Some(4),
            Self::NulTerminated | Self::LengthPrefixed => None,
        }
    }
}

/// How the extracted bytes become an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    /// Integer, or float when the rule has a scale.
    Number,
    /// Non-zero means true.
    Flag,
    /// Model code; also resolves the model name.
    ModelCode,
    Text,
    /// Nested register block.
    Registers,
}

/// When a tag counts toward the frame's event total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    Never,
    Always,
    /// Only when the raw value equals this.
    OnValue(u32),
}

impl EventTrigger {
    /// Whether a field with raw unsigned value `raw` fires the trigger.
    /// Non-numeric fields pass `None`.
    pub fn fires(&self, raw: Option<u32>) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::OnValue(expected) => raw == Some(*expected),
        }
    }
}

/// Decode rule for one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodeRule {
    pub tag: u8,
    pub width: WidthClass,
    pub signed: bool,
    /// Divisor applied to numeric values.
    pub scale: Option<u32>,
    /// Destination attribute name.
    pub name: &'static str,
    pub interpretation: Interpretation,
    pub event: EventTrigger,
}

impl DecodeRule {
    const fn new(tag: u8, width: WidthClass, name: &'static str) -> Self {
        Self {
            tag,
            width,
            signed: false,
            scale: None,
            name,
            interpretation: Interpretation::Number,
            event: EventTrigger::Never,
        }
    }

    const fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    const fn scaled(mut self, divisor: u32) -> Self {
        self.scale = Some(divisor);
        self
    }

    const fn interpreted(mut self, interpretation: Interpretation) -> Self {
        self.interpretation = interpretation;
        self
    }

    const fn event(mut self) -> Self {
        self.event = EventTrigger::Always;
        self
    }

    const fn event_on(mut self, value: u32) -> Self {
        self.event = EventTrigger::OnValue(value);
        self
    }
}

const fn u8_(tag: u8, name: &'static str) -> DecodeRule {
    DecodeRule::new(tag, WidthClass::Fixed1, name)
}

const fn u16_(tag: u8, name: &'static str) -> DecodeRule {
    DecodeRule::new(tag, WidthClass::Fixed2, name)
}

const fn u32_(tag: u8, name: &'static str) -> DecodeRule {
    DecodeRule::new(tag, WidthClass::Fixed4, name)
}

const fn flag(tag: u8, name: &'static str) -> DecodeRule {
    u8_(tag, name).interpreted(Interpretation::Flag)
}

const fn text(tag: u8, name: &'static str) -> DecodeRule {
    DecodeRule::new(tag, WidthClass::NulTerminated, name).interpreted(Interpretation::Text)
}

/// Tag carrying the nested register block.
pub const REGISTER_BLOCK_TAG: u8 = 0x95;

/// All known tags, sorted by tag.
pub static TAG_RULES: &[DecodeRule] = &[
    u8_(0x01, "model").interpreted(Interpretation::ModelCode),
    u32_(0x02, "downlinkCount"),
    flag(0x03, "tamperEvent").event(),
    u16_(0x04, "batteryVoltage").scaled(1000),
    // 1 = battery low
    u8_(0x05, "batteryState").event_on(1),
    text(0x06, "bootVersion"),
    text(0x07, "mainVersion"),
    text(0x08, "appVersion"),
    text(0x09, "hardwareVersion"),
    u32_(0x0a, "p2pUpdateFrequency"),
    u32_(0x0b, "p2pConfigFrequency"),
    text(0x0c, "radioChip"),
    text(0x0d, "resetCause"),
    text(0x0e, "region"),
    text(0x0f, "atResponse"),
    u16_(0x10, "temperature").signed().scaled(100),
    u8_(0x11, "temperatureEvent"),
    u16_(0x12, "humidity").scaled(10),
    u8_(0x13, "humidityEvent"),
    u8_(0x14, "sosEvent").event(),
    u16_(0x15, "gasConcentration"),
    flag(0x16, "gasAlarm").event(),
    flag(0x17, "infraredAlarm").event(),
    u8_(0x18, "magnetState"),
    u8_(0x19, "brightnessState"),
    u16_(0x1a, "dcVoltage"),
    u8_(0x1b, "sensorState"),
    u8_(0x1c, "buttonState"),
    flag(0x1d, "gasAlarm").event(),
    u8_(0x1e, "noxiousGasState"),
    u8_(0x1f, "oxygenState"),
    u8_(0x20, "oxygenConcentration"),
    flag(0x21, "floodAlarm").event(),
    u8_(0x22, "breakerState"),
    u8_(0x23, "noxiousGasConcentration"),
    flag(0x24, "doorEvent").event(),
    u8_(0x25, "switchAddress"),
    u8_(0x26, "switchType"),
    u16_(0x27, "lineVoltage"),
    u16_(0x28, "leakageCurrent"),
    u16_(0x29, "linePower"),
    u16_(0x2a, "lineCurrent"),
    u16_(0x2b, "breakerAlarm"),
    u32_(0x2c, "powerConsumption"),
    u8_(0x2e, "breakerControl"),
    u8_(0x2f, "switchCount"),
    u8_(0x30, "errorCode"),
    flag(0x31, "smokeAlarm").event(),
    u8_(0x32, "smokeAlarmStatus"),
    u8_(0x3b, "smokeAlarmStatus"),
    u8_(0x6d, "packetType"),
    u16_(0x72, "irdaCount"),
    u16_(0x73, "soakingDuration"),
    u16_(0x74, "smokeBluePa"),
    u16_(0x75, "smokeRedPa"),
    flag(0x76, "doorState"),
    flag(0x77, "tamperState"),
    u32_(0x78, "heartbeatInterval"),
    u32_(0x79, "deviceTime"),
    u16_(0x7a, "methane"),
    u16_(0x7b, "so2"),
    u16_(0x7c, "no2"),
    u8_(0x7d, "batteryState"),
    u8_(0x7e, "powerDown"),
    u16_(0x7f, "adc"),
    u16_(0x80, "liquidLevel"),
    u8_(0x81, "liquidLevelEvent"),
    u8_(0x82, "selfCheck"),
    u8_(0x83, "mute"),
    flag(0x84, "smokeState"),
    flag(0x85, "floodState"),
    u8_(0x86, "bellState"),
    u8_(0x87, "backlightState"),
    u8_(0x88, "countdown"),
    u8_(0x89, "timer"),
    u16_(0x8a, "formaldehyde"),
    u8_(0x8b, "airQuality"),
    u8_(0x8c, "temperatureAlarmSetting"),
    u8_(0x8f, "rs485Channel"),
    u32_(0x90, "bleBeaconId"),
    u8_(0x91, "bleRssiAt1m").signed(),
    u8_(0x92, "bleRssi").signed(),
    u8_(0x93, "batteryPercentage"),
    u8_(0x94, "rs485Address"),
    DecodeRule::new(REGISTER_BLOCK_TAG, WidthClass::LengthPrefixed, "registers")
        .interpreted(Interpretation::Registers),
    u8_(0x96, "switchLock"),
    u16_(0x97, "voltageRms"),
    u16_(0x98, "current"),
    u16_(0x99, "activePower"),
    u32_(0x9a, "electricEnergy"),
    u8_(0x9b, "liquidLevelState"),
    u8_(0x9c, "pressureState"),
    u16_(0x9d, "h2s"),
    u16_(0x9e, "nh4"),
    u16_(0x9f, "hcho"),
    u16_(0xa0, "tvoc"),
    u16_(0xa2, "accDiffAbs"),
    u16_(0xa3, "accAbs"),
    u16_(0xa4, "accX").signed(),
    u16_(0xa5, "accY").signed(),
    u16_(0xa6, "accZ").signed(),
    u8_(0xa7, "accAttr"),
    u8_(0xa8, "accEvent"),
    u8_(0xa9, "temperatureState"),
    u16_(0xaa, "temperature").scaled(10),
    u16_(0xab, "commandResponse"),
    u8_(0xac, "waterHammerAttr"),
    u32_(0xad, "waterHammerDuration"),
    u8_(0xae, "waterHammerEvent"),
    u32_(0xb9, "radarDistance"),
];

/// Look up the decode rule for `tag`.
pub fn lookup(tag: u8) -> Option<&'static DecodeRule> {
    TAG_RULES
        .binary_search_by_key(&tag, |rule| rule.tag)
        .ok()
        .map(|idx| &TAG_RULES[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sorted_and_unique() {
        for pair in TAG_RULES.windows(2) {
            assert!(
                pair[0].tag < pair[1].tag,
                "tags out of order: 0x{:02x} 0x{:02x}",
                pair[0].tag,
                pair[1].tag
            );
        }
    }

    #[test]
    fn test_representative_rules() {
        let temp = lookup(0x10).unwrap();
        assert_eq!(temp.name, "temperature");
        assert_eq!(temp.width, WidthClass::Fixed2);
        assert!(temp.signed);
        assert_eq!(temp.scale, Some(100));

        let battery = lookup(0x04).unwrap();
        assert_eq!(battery.scale, Some(1000));
        assert!(!battery.signed);

        let humidity = lookup(0x12).unwrap();
        assert_eq!(humidity.scale, Some(10));

        let block = lookup(REGISTER_BLOCK_TAG).unwrap();
        assert_eq!(block.width, WidthClass::LengthPrefixed);
        assert_eq!(block.interpretation, Interpretation::Registers);
    }

    #[test]
    fn test_unknown_tags() {
        assert!(lookup(0x00).is_none());
        assert!(lookup(0x2d).is_none());
        assert!(lookup(0xff).is_none());
    }

    #[test]
    fn test_event_triggers() {
        assert_eq!(lookup(0x31).unwrap().event, EventTrigger::Always);
        assert_eq!(lookup(0x77).unwrap().event, EventTrigger::Never);

        let battery = lookup(0x05).unwrap();
        assert!(battery.event.fires(Some(1)));
        assert!(!battery.event.fires(Some(0)));
        assert!(!battery.event.fires(None));
    }

    #[test]
    fn test_scaled_rules_are_numeric() {
        for rule in TAG_RULES.iter().filter(|r| r.scale.is_some()) {
            assert_eq!(rule.interpretation, Interpretation::Number, "{}", rule.name);
            assert!(rule.width.fixed_width().is_some(), "{}", rule.name);
        }
    }
}
