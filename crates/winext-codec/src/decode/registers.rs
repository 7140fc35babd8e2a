//! Nested register block decoding.
//!
//! The block is a run of big-endian 16-bit cells. The first cell is a header:
//! if it equals [`CONTROL_BASE`] the following cells are control/status
//! registers addressed from `CONTROL_BASE`, otherwise they are device status
//! registers addressed from 0.

use tracing::trace;

use crate::registry::addresses::{register, CONTROL_BASE};
use crate::value::{AttributeMap, AttributeValue};

/// Cell size in bytes.
const CELL: usize = 2;

/// Address space selected by the block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    DeviceStatus,
    ControlStatus,
}

impl AddressingMode {
    pub fn from_header(header: u16) -> Self {
        if header == CONTROL_BASE {
            Self::ControlStatus
        } else {
            Self::DeviceStatus
        }
    }

    /// Address of the first cell after the header.
    pub fn base(&self) -> u16 {
        match self {
            Self::DeviceStatus => 0,
            Self::ControlStatus => CONTROL_BASE,
        }
    }
}

/// How a register cell is turned into an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// High byte hardware, low byte software, rendered "hw.sw".
    VersionPair,
    Unsigned,
    Signed { divisor: u32 },
    /// Non-zero low byte means true.
    LowByteFlag,
    /// Low byte as a signed integer.
    LowByteSigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRule {
    pub address: u16,
    pub name: &'static str,
    pub kind: RegisterKind,
}

const fn rule(address: u16, name: &'static str, kind: RegisterKind) -> RegisterRule {
    RegisterRule {
        address,
        name,
        kind,
    }
}

/// Known registers, sorted by address.
pub static REGISTER_RULES: &[RegisterRule] = &[
    rule(register::VERSION, "registerVersion", RegisterKind::VersionPair),
    rule(
        register::CURRENT_TEMPERATURE,
        "currentTemperature",
        RegisterKind::Signed { divisor: 100 },
    ),
    rule(
        register::SET_TEMPERATURE,
        "setTemperature",
        RegisterKind::Signed { divisor: 100 },
    ),
    rule(register::WORK_MODE, "workMode", RegisterKind::Unsigned),
    rule(register::FAN_SPEED, "fanSpeed", RegisterKind::Unsigned),
    rule(register::POWER, "power", RegisterKind::LowByteFlag),
    rule(register::LOCK, "lock", RegisterKind::LowByteFlag),
    rule(register::REBOOT, "reboot", RegisterKind::LowByteFlag),
    rule(
        register::SIGNAL_STRENGTH,
        "signalStrength",
        RegisterKind::LowByteSigned,
    ),
];

fn lookup(address: u16) -> Option<&'static RegisterRule> {
    REGISTER_RULES
        .binary_search_by_key(&address, |r| r.address)
        .ok()
        .map(|idx| &REGISTER_RULES[idx])
}

impl RegisterKind {
    fn interpret(&self, cell: u16) -> AttributeValue {
        let [hi, lo] = cell.to_be_bytes();
        match self {
            Self::VersionPair => AttributeValue::String(format!("{}.{}", hi, lo)),
            Self::Unsigned => AttributeValue::Integer(cell as i64),
            Self::Signed { divisor } => AttributeValue::Float(cell as i16 as f64 / *divisor as f64),
            Self::LowByteFlag => AttributeValue::Boolean(lo != 0),
            Self::LowByteSigned => AttributeValue::Integer(lo as i8 as i64),
        }
    }
}

/// Decode a register block into `sink`.
///
/// Unknown addresses are skipped without comment; a trailing odd byte is
/// never read.
pub fn decode_registers(block: &[u8], sink: &mut AttributeMap) {
    if block.len() < CELL {
        trace!("register block of {} byte(s) has no header", block.len());
        return;
    }

    let header = u16::from_be_bytes([block[0], block[1]]);
    let mode = AddressingMode::from_header(header);
    let base = mode.base();
    trace!("register block header 0x{:04x}, mode {:?}", header, mode);

    for (index, cell) in block[CELL..].chunks_exact(CELL).enumerate() {
        let address = base.wrapping_add(index as u16);
        let value = u16::from_be_bytes([cell[0], cell[1]]);
        match lookup(address) {
            Some(rule) => {
                trace!("register 0x{:04x} '{}' = 0x{:04x}", address, rule.name, value);
                sink.insert(rule.name.to_string(), rule.kind.interpret(value));
            }
            None => trace!("skipping unknown register 0x{:04x}", address),
        }
    }
}
