//! Uplink frame reader.
//!
//! A frame is one reserved byte followed by `[tag][value]` pairs. Each tag's
//! rule in the tag registry says how wide the value is and where it goes; the
//! loop itself is the same for every device family.
//!
//! Decoding is fail-closed: an unknown tag or a field that runs past the end
//! of the buffer stops the loop, because nothing after it can be aligned.
//! Attributes decoded before that point are kept.

mod registers;

pub use registers::{decode_registers, AddressingMode, RegisterKind, RegisterRule, REGISTER_RULES};

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::CodecConfig;
use crate::error::{CodecError, DecodeError};
use crate::registry::models::model_name;
use crate::registry::tags::{self, DecodeRule, Interpretation, WidthClass};
use crate::value::{AttributeMap, AttributeValue};

/// Reserved marker plus at least one tag byte.
pub const MIN_FRAME_LEN: usize = 2;

/// Offset of the first tag.
const FIRST_TAG_OFFSET: usize = 1;

/// Result of decoding one frame.
///
/// A non-empty `errors` list means the call failed and `attributes` is empty.
/// A non-empty `warnings` list means decoding stopped early; `attributes`
/// holds everything read before that point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodeOutcome {
    pub attributes: AttributeMap,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Event-class tags seen in this frame.
    pub events: u32,
    #[serde(skip)]
    issues: Vec<DecodeError>,
}

impl DecodeOutcome {
    /// No errors and no warnings.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Usable but incomplete.
    pub fn is_partial(&self) -> bool {
        self.errors.is_empty() && !self.warnings.is_empty()
    }

    /// Typed form of every error and warning, in the order they occurred.
    pub fn issues(&self) -> &[DecodeError] {
        &self.issues
    }

    /// Attributes, or the first fatal error.
    pub fn into_result(self) -> Result<AttributeMap, CodecError> {
        match self.issues.into_iter().find(DecodeError::is_fatal) {
            Some(err) => Err(err.into()),
            None => Ok(self.attributes),
        }
    }

    fn report(&mut self, issue: DecodeError) {
        if issue.is_fatal() {
            self.errors.push(issue.to_string());
        } else {
            self.warnings.push(issue.to_string());
        }
        self.issues.push(issue);
    }

    fn fail(issue: DecodeError) -> Self {
        let mut outcome = Self::default();
        outcome.report(issue);
        outcome
    }
}

/// Raw value extracted for one tag.
#[derive(Debug)]
enum Field<'a> {
    Unsigned(u32),
    Signed(i32),
    Text(String),
    Block(&'a [u8]),
}

/// Decode one uplink frame using the built-in tag registry.
pub fn decode(buffer: &[u8]) -> DecodeOutcome {
    if buffer.len() < MIN_FRAME_LEN {
        warn!("Frame too short ({} bytes)", buffer.len());
        return DecodeOutcome::fail(DecodeError::FrameTooShort {
            len: buffer.len(),
            min: MIN_FRAME_LEN,
        });
    }

    let mut outcome = DecodeOutcome::default();
    let mut cursor = FIRST_TAG_OFFSET;

    while cursor < buffer.len() {
        let offset = cursor;
        let tag = buffer[cursor];
        cursor += 1;

        let Some(rule) = tags::lookup(tag) else {
            let remaining = buffer.len() - cursor;
            warn!(
                "Unknown tag 0x{:02x} at offset {}, ignoring {} trailing byte(s)",
                tag, offset, remaining
            );
            outcome.report(DecodeError::UnknownTag {
                tag,
                offset,
                remaining,
            });
            break;
        };

        match read_field(buffer, cursor, rule) {
            Ok((field, consumed)) => {
                trace!(
                    "tag 0x{:02x} '{}' at offset {}: {:?}",
                    tag,
                    rule.name,
                    offset,
                    field
                );
                let raw = match &field {
                    Field::Unsigned(v) => Some(*v),
                    _ => None,
                };
                if rule.event.fires(raw) {
                    outcome.events += 1;
                }
                store(rule, field, &mut outcome.attributes);
                cursor += consumed;
            }
            Err(err) => {
                warn!("{}", err);
                outcome.report(err);
                break;
            }
        }
    }

    debug!(
        "Decoded {} attribute(s) from {} byte frame, {} warning(s)",
        outcome.attributes.len(),
        buffer.len(),
        outcome.warnings.len()
    );
    outcome
}

/// Extract the value for `rule` starting at `cursor` (just past the tag).
/// Returns the field and the number of bytes it occupied.
fn read_field<'a>(
    buffer: &'a [u8],
    cursor: usize,
    rule: &DecodeRule,
) -> Result<(Field<'a>, usize), DecodeError> {
    let available = buffer.len() - cursor;
    let truncated = |needed: usize| DecodeError::TruncatedField {
        tag: rule.tag,
        name: rule.name,
        offset: cursor - 1,
        needed,
        available,
    };

    match rule.width {
        WidthClass::Fixed1 | WidthClass::Fixed2 | WidthClass::Fixed4 => {
            let width = rule.width.fixed_width().unwrap_or(0);
            if width > available {
                return Err(truncated(width));
            }
            let bytes = &buffer[cursor..cursor + width];
            let field = match (width, rule.signed) {
                (1, false) => Field::Unsigned(bytes[0] as u32),
                (1, true) => Field::Signed(bytes[0] as i8 as i32),
                (2, false) => Field::Unsigned(u16::from_be_bytes([bytes[0], bytes[1]]) as u32),
                (2, true) => Field::Signed(i16::from_be_bytes([bytes[0], bytes[1]]) as i32),
                (_, false) => {
                    Field::Unsigned(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                }
                (_, true) => {
                    Field::Signed(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                }
            };
            Ok((field, width))
        }
        WidthClass::NulTerminated => {
            if available == 0 {
                return Err(truncated(1));
            }
            let rest = &buffer[cursor..];
            let (text, consumed) = match rest.iter().position(|b| *b == 0) {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            Ok((
                Field::Text(String::from_utf8_lossy(text).into_owned()),
                consumed,
            ))
        }
        WidthClass::LengthPrefixed => {
            if available == 0 {
                return Err(truncated(1));
            }
            let len = buffer[cursor] as usize;
            if 1 + len > available {
                return Err(truncated(1 + len));
            }
            Ok((Field::Block(&buffer[cursor + 1..cursor + 1 + len]), 1 + len))
        }
    }
}

/// Convert a field to attributes and write them into `sink`.
fn store(rule: &DecodeRule, field: Field<'_>, sink: &mut AttributeMap) {
    let name = rule.name.to_string();
    match (rule.interpretation, field) {
        (_, Field::Block(block)) => decode_registers(block, sink),
        (_, Field::Text(text)) => {
            sink.insert(name, AttributeValue::String(text));
        }
        (interpretation, field) => {
            let raw = match field {
                Field::Unsigned(v) => v as i64,
                Field::Signed(v) => v as i64,
                Field::Text(_) | Field::Block(_) => return,
            };
            match interpretation {
                Interpretation::Flag => {
                    sink.insert(name, AttributeValue::Boolean(raw != 0));
                }
                Interpretation::ModelCode => {
                    sink.insert(name, AttributeValue::Integer(raw));
                    match model_name(raw as u8) {
                        Some(model) => {
                            sink.insert("modelName".to_string(), model.into());
                        }
                        None => {
                            sink.remove("modelName");
                        }
                    }
                }
                _ => {
                    let value = match rule.scale {
                        Some(divisor) => AttributeValue::Float(raw as f64 / divisor as f64),
                        None => AttributeValue::Integer(raw),
                    };
                    sink.insert(name, value);
                }
            }
        }
    }
}

/// Frame reader bound to a configuration.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: CodecConfig,
}

impl Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a frame after enforcing the configured length cap.
    pub fn decode(&self, buffer: &[u8]) -> DecodeOutcome {
        if buffer.len() > self.config.max_frame_len {
            warn!(
                "Rejecting {} byte frame, limit is {}",
                buffer.len(),
                self.config.max_frame_len
            );
            return DecodeOutcome::fail(DecodeError::FrameTooLong {
                len: buffer.len(),
                max: self.config.max_frame_len,
            });
        }
        decode(buffer)
    }

    /// Decode an uplink received on application port `port`. Frames on
    /// other ports do not carry TLV telemetry and are rejected.
    pub fn decode_uplink(&self, port: u8, buffer: &[u8]) -> DecodeOutcome {
        if port != self.config.uplink_port {
            debug!(
                "Ignoring uplink on port {} (telemetry port is {})",
                port, self.config.uplink_port
            );
            return DecodeOutcome::fail(DecodeError::UnexpectedPort {
                port,
                expected: self.config.uplink_port,
            });
        }
        self.decode(buffer)
    }
}
