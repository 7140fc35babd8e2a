//! Control frame encoder.
//!
//! Turns a set of requested attribute changes into one downlink frame:
//!
//! ```text
//! single write: [0x06][0x06][addrHi][addrLo][valHi][valLo]
//! multi write:  [0x07][nodeId][0x10][startHi][startLo][countHi][countLo]
//!               [byteCount][v1Hi][v1Lo]...[crcLo][crcHi]
//! ```
//!
//! The multi-write CRC covers `nodeId` through the last value byte. It is
//! only used when the resolved registers form one contiguous run; otherwise
//! only the lowest register is written and the rest are reported as dropped.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::checksum::checksum_bytes;
use crate::config::CodecConfig;
use crate::error::{CodecError, EncodeError};
use crate::registry::addresses;
use crate::value::AttributeValue;

/// Requested changes, attribute name to raw value.
pub type ControlRequest = BTreeMap<String, AttributeValue>;

/// Leading byte identifying a single-register downlink.
pub const SINGLE_WRITE_MARKER: u8 = 0x06;

/// Leading byte identifying a multi-register downlink.
pub const MULTI_WRITE_MARKER: u8 = 0x07;

/// Registers one multi-write may carry.
pub const MAX_REGISTERS_PER_WRITE: usize = 123;

/// Register function codes used on the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum FunctionCode {
    WriteSingleRegister = 0x06,
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Destination channel for an outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Binary register writes.
    DeviceControl,
    /// Newline-terminated AT commands.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    SingleWrite,
    MultiWrite,
    Command,
}

/// Bytes ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundFrame {
    pub channel: Channel,
    pub kind: FrameKind,
    pub bytes: Vec<u8>,
}

/// One resolved register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterWrite {
    pub name: &'static str,
    pub address: u16,
    pub value: u16,
}

impl RegisterWrite {
    fn label(&self) -> String {
        format!("{} (address {})", self.name, self.address)
    }
}

/// Result of encoding a control request.
///
/// `frame` is `None` exactly when `errors` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncodeOutcome {
    pub frame: Option<OutboundFrame>,
    /// Register writes carried by `frame`.
    pub writes: Vec<RegisterWrite>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    issues: Vec<EncodeError>,
}

impl EncodeOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.errors.is_empty() && !self.warnings.is_empty()
    }

    pub fn issues(&self) -> &[EncodeError] {
        &self.issues
    }

    /// The frame, or the first fatal error.
    pub fn into_result(self) -> Result<OutboundFrame, CodecError> {
        if let Some(err) = self.issues.into_iter().find(EncodeError::is_fatal) {
            return Err(err.into());
        }
        self.frame
            .ok_or_else(|| EncodeError::NoRecognizedAttributes.into())
    }

    fn report(&mut self, issue: EncodeError) {
        if issue.is_fatal() {
            self.errors.push(issue.to_string());
        } else {
            self.warnings.push(issue.to_string());
        }
        self.issues.push(issue);
    }
}

/// Encode a control request with the default configuration.
pub fn encode(request: &ControlRequest) -> EncodeOutcome {
    Encoder::default().encode(request)
}

/// Control encoder bound to a configuration.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: CodecConfig,
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Resolve `request` against the address table and build one frame.
    pub fn encode(&self, request: &ControlRequest) -> EncodeOutcome {
        let mut outcome = EncodeOutcome::default();
        let mut writes = resolve(request, &mut outcome);

        if writes.is_empty() {
            warn!("Control request has no recognized attributes");
            outcome.report(EncodeError::NoRecognizedAttributes);
            return outcome;
        }

        writes.sort_by_key(|w| w.address);

        if writes.len() == 1 {
            outcome.frame = Some(single_write(&writes[0]));
            outcome.writes = writes;
            return outcome;
        }

        let Some(reason) = self.fallback_reason(&writes) else {
            debug!(
                "Consolidating {} registers from address {}",
                writes.len(),
                writes[0].address
            );
            outcome.frame = Some(multi_write(self.config.node_id, &writes));
            outcome.writes = writes;
            return outcome;
        };

        let kept = writes[0];
        let dropped = writes[1..]
            .iter()
            .map(RegisterWrite::label)
            .collect::<Vec<_>>()
            .join(", ");
        let issue = reason.into_error(writes.len(), kept.label(), dropped);
        warn!("{}", issue);
        outcome.report(issue);
        outcome.frame = Some(single_write(&kept));
        outcome.writes = vec![kept];
        outcome
    }
}

/// Why several writes cannot share one multi-write frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    Gap,
    Disabled,
    TooMany,
}

impl Fallback {
    fn into_error(self, count: usize, kept: String, dropped: String) -> EncodeError {
        match self {
            Self::Gap => EncodeError::NonContiguous { kept, dropped },
            Self::Disabled => EncodeError::ConsolidationDisabled { kept, dropped },
            Self::TooMany => EncodeError::TooManyRegisters {
                count,
                max: MAX_REGISTERS_PER_WRITE,
                kept,
                dropped,
            },
        }
    }
}

impl Encoder {
    /// `None` when the sorted `writes` can go out as one multi-write.
    fn fallback_reason(&self, writes: &[RegisterWrite]) -> Option<Fallback> {
        if !is_contiguous(writes) {
            Some(Fallback::Gap)
        } else if !self.config.consolidate_writes {
            Some(Fallback::Disabled)
        } else if writes.len() > MAX_REGISTERS_PER_WRITE {
            Some(Fallback::TooMany)
        } else {
            None
        }
    }
}

/// Look up, clamp and scale every entry; problems go to `outcome`.
fn resolve(request: &ControlRequest, outcome: &mut EncodeOutcome) -> Vec<RegisterWrite> {
    let mut writes = Vec::with_capacity(request.len());
    for (name, value) in request {
        let Some(rule) = addresses::lookup(name) else {
            warn!("Dropping unknown control attribute '{}'", name);
            outcome.report(EncodeError::UnknownAttribute(name.clone()));
            continue;
        };
        let Some(number) = value.as_f64() else {
            warn!("Dropping control attribute '{}' with value {}", name, value);
            outcome.report(EncodeError::NonNumericValue {
                name: name.clone(),
                type_name: value.type_name(),
            });
            continue;
        };
        if !number.is_finite() {
            warn!("Dropping control attribute '{}' with value {}", name, number);
            outcome.report(EncodeError::NonFiniteValue {
                name: name.clone(),
                value: number.to_string(),
            });
            continue;
        }
        let scaled = rule.scale(number);
        if let Some(clamped) = scaled.clamped_to {
            debug!("Clamped '{}' from {} to {}", name, number, clamped);
        }
        writes.push(RegisterWrite {
            name: rule.name,
            address: rule.address,
            value: scaled.register,
        });
    }
    writes
}

fn is_contiguous(writes: &[RegisterWrite]) -> bool {
    writes
        .windows(2)
        .all(|pair| pair[0].address.checked_add(1) == Some(pair[1].address))
}

fn single_write(write: &RegisterWrite) -> OutboundFrame {
    let mut bytes = Vec::with_capacity(6);
    bytes.push(SINGLE_WRITE_MARKER);
    bytes.push(FunctionCode::WriteSingleRegister.code());
    bytes.extend_from_slice(&write.address.to_be_bytes());
    bytes.extend_from_slice(&write.value.to_be_bytes());
    OutboundFrame {
        channel: Channel::DeviceControl,
        kind: FrameKind::SingleWrite,
        bytes,
    }
}

/// `writes` must be sorted, contiguous and at most
/// [`MAX_REGISTERS_PER_WRITE`] long.
fn multi_write(node_id: u8, writes: &[RegisterWrite]) -> OutboundFrame {
    let count = writes.len() as u16;
    let mut bytes = Vec::with_capacity(10 + writes.len() * 2);
    bytes.push(MULTI_WRITE_MARKER);
    bytes.push(node_id);
    bytes.push(FunctionCode::WriteMultipleRegisters.code());
    bytes.extend_from_slice(&writes[0].address.to_be_bytes());
    bytes.extend_from_slice(&count.to_be_bytes());
    bytes.push((count * 2) as u8);
    for write in writes {
        bytes.extend_from_slice(&write.value.to_be_bytes());
    }
    let crc = checksum_bytes(&bytes[1..]);
    bytes.extend_from_slice(&crc);
    OutboundFrame {
        channel: Channel::DeviceControl,
        kind: FrameKind::MultiWrite,
        bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;

    fn request(entries: &[(&str, AttributeValue)]) -> ControlRequest {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_single_write_set_temperature() {
        let outcome = encode(&request(&[("setTemperature", 25.5.into())]));
        assert!(outcome.is_ok());
        let frame = outcome.frame.unwrap();
        assert_eq!(frame.kind, FrameKind::SingleWrite);
        assert_eq!(frame.channel, Channel::DeviceControl);
        assert_eq!(frame.bytes, vec![0x06, 0x06, 0x00, 0x04, 0x09, 0xF6]);
    }

    #[test]
    fn test_multi_write_layout() {
        let outcome = encode(&request(&[
            ("setTemperature", 25.5.into()),
            ("workMode", 1i64.into()),
            ("fanSpeed", 2i64.into()),
        ]));
        assert!(outcome.is_ok());
        let frame = outcome.frame.unwrap();
        assert_eq!(frame.kind, FrameKind::MultiWrite);
        assert_eq!(
            &frame.bytes[..14],
            &[
                0x07, 0x01, 0x10, 0x00, 0x04, 0x00, 0x03, 0x06, 0x09, 0xF6, 0x00, 0x01, 0x00,
                0x02
            ]
        );
        assert_eq!(frame.bytes.len(), 16);
        assert!(checksum::verify(&frame.bytes[1..]));
    }

    #[test]
    fn test_gap_falls_back_to_lowest() {
        let outcome = encode(&request(&[
            ("setTemperature", 21.0.into()),
            ("fanSpeed", 1i64.into()),
        ]));
        assert!(outcome.is_partial());
        let frame = outcome.frame.unwrap();
        assert_eq!(frame.bytes, vec![0x06, 0x06, 0x00, 0x04, 0x08, 0x34]);
        assert!(outcome.warnings[0].contains("fanSpeed (address 6)"));
        assert_eq!(outcome.writes.len(), 1);
    }

    #[test]
    fn test_node_id_and_consolidation_flag() {
        let req = request(&[("power", true.into()), ("lock", false.into())]);

        let encoder = Encoder::new(CodecConfig {
            node_id: 0x22,
            ..CodecConfig::default()
        });
        let frame = encoder.encode(&req).frame.unwrap();
        assert_eq!(frame.bytes[1], 0x22);
        assert_eq!(&frame.bytes[3..5], &[0x10, 0x00]);

        let encoder = Encoder::new(CodecConfig {
            consolidate_writes: false,
            ..CodecConfig::default()
        });
        let outcome = encoder.encode(&req);
        assert!(matches!(
            outcome.issues()[0],
            EncodeError::ConsolidationDisabled { .. }
        ));
        assert_eq!(
            outcome.frame.unwrap().bytes,
            vec![0x06, 0x06, 0x10, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_unknown_and_non_numeric() {
        let outcome = encode(&request(&[
            ("colour", 3i64.into()),
            ("workMode", "auto".into()),
        ]));
        assert!(outcome.frame.is_none());
        assert_eq!(outcome.errors, vec!["no recognized control attributes"]);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_non_finite_value() {
        let outcome = encode(&request(&[
            ("setTemperature", f64::NAN.into()),
            ("workMode", f64::INFINITY.into()),
        ]));
        assert!(outcome.frame.is_none());
        assert!(matches!(
            outcome.issues()[0],
            EncodeError::NonFiniteValue { .. }
        ));
        assert!(outcome.warnings[0].contains("non-finite value NaN"));
        assert!(outcome.warnings[1].contains("non-finite value inf"));
    }

    fn run(first: u16, len: u16) -> Vec<RegisterWrite> {
        (first..first + len)
            .map(|address| RegisterWrite {
                name: "test",
                address,
                value: 0,
            })
            .collect()
    }

    #[test]
    fn test_fallback_reasons() {
        let encoder = Encoder::default();
        assert_eq!(encoder.fallback_reason(&run(4, 3)), None);
        assert_eq!(
            encoder.fallback_reason(&run(0, MAX_REGISTERS_PER_WRITE as u16)),
            None
        );
        assert_eq!(
            encoder.fallback_reason(&run(0, MAX_REGISTERS_PER_WRITE as u16 + 1)),
            Some(Fallback::TooMany)
        );

        let mut gap = run(4, 1);
        gap.extend(run(6, 1));
        assert_eq!(encoder.fallback_reason(&gap), Some(Fallback::Gap));

        let encoder = Encoder::new(CodecConfig {
            consolidate_writes: false,
            ..CodecConfig::default()
        });
        assert_eq!(encoder.fallback_reason(&run(4, 3)), Some(Fallback::Disabled));
    }

    #[test]
    fn test_too_many_registers_message() {
        let err = Fallback::TooMany.into_error(124, "a".into(), "b".into());
        assert!(matches!(err, EncodeError::TooManyRegisters { count: 124, max: 123, .. }));
        assert!(!err.to_string().contains("disabled"));
    }

    #[test]
    fn test_clamped_mode() {
        let outcome = encode(&request(&[("workMode", 12i64.into())]));
        assert!(outcome.is_ok());
        assert_eq!(outcome.frame.unwrap().bytes[5], 4);
    }
}
