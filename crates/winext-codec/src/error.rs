//! Error types for the codec.
//!
//! Decode and encode never fail outright; they report problems through the
//! `errors` / `warnings` lists of their outcome. The lists hold the `Display`
//! rendering of the variants below so the text and the typed form agree.

use thiserror::Error;

/// Problems found while decoding an uplink frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes than the reserved marker plus one tag.
    #[error("frame too short: {len} byte(s), need at least {min}")]
    FrameTooShort { len: usize, min: usize },

    /// Buffer longer than the configured cap.
    #[error("frame too long: {len} bytes exceeds limit of {max}")]
    FrameTooLong { len: usize, max: usize },

    /// Frame arrived on a port that does not carry TLV telemetry.
    #[error("unexpected application port {port}, expected {expected}")]
    UnexpectedPort { port: u8, expected: u8 },

    /// Tag without a decode rule; the rest of the frame is skipped.
    #[error("unknown tag 0x{tag:02x} at offset {offset}, remaining {remaining} byte(s) ignored")]
    UnknownTag {
        tag: u8,
        offset: usize,
        remaining: usize,
    },

    /// Field whose declared width runs past the end of the buffer.
    #[error(
        "truncated field '{name}' (tag 0x{tag:02x}) at offset {offset}: need {needed} byte(s), {available} available"
    )]
    TruncatedField {
        tag: u8,
        name: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl DecodeError {
    /// Whether the condition aborts the whole call (goes to `errors`).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. } | Self::FrameTooLong { .. } | Self::UnexpectedPort { .. }
        )
    }
}

/// Problems found while encoding a control request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Name not present in the address table.
    #[error("unknown control attribute '{0}'")]
    UnknownAttribute(String),

    /// Value that cannot be turned into a register number.
    #[error("control attribute '{name}' has non-numeric value of type {type_name}")]
    NonNumericValue {
        name: String,
        type_name: &'static str,
    },

    /// Numeric value that is NaN or infinite.
    #[error("control attribute '{name}' has non-finite value {value}")]
    NonFiniteValue { name: String, value: String },

    /// Nothing left to write after resolution.
    #[error("no recognized control attributes")]
    NoRecognizedAttributes,

    /// Resolved addresses have a gap; only the lowest one is sent.
    #[error("registers are not contiguous, sent {kept} only; dropped {dropped}")]
    NonContiguous { kept: String, dropped: String },

    /// Consolidation switched off; only the lowest address is sent.
    #[error("multi-register writes disabled, sent {kept} only; dropped {dropped}")]
    ConsolidationDisabled { kept: String, dropped: String },

    /// Contiguous run longer than one frame can carry.
    #[error(
        "{count} registers exceed the limit of {max} per write, sent {kept} only; dropped {dropped}"
    )]
    TooManyRegisters {
        count: usize,
        max: usize,
        kept: String,
        dropped: String,
    },
}

impl EncodeError {
    /// Whether the condition aborts the whole call (goes to `errors`).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoRecognizedAttributes)
    }
}

/// Problems building configuration-channel commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("AT command name is empty")]
    EmptyName,

    #[error("invalid character {ch:?} in AT command name '{name}'")]
    InvalidName { name: String, ch: char },

    #[error("AT command argument contains a line break")]
    InvalidArgument,
}

/// Errors loading codec configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for environment variable {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Umbrella error for callers that prefer `?` over outcome inspection.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for the codec.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(DecodeError::FrameTooShort { len: 1, min: 2 }.is_fatal());
        assert!(!DecodeError::UnknownTag {
            tag: 0xfe,
            offset: 3,
            remaining: 2
        }
        .is_fatal());
        assert!(EncodeError::NoRecognizedAttributes.is_fatal());
        assert!(!EncodeError::UnknownAttribute("x".into()).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = DecodeError::UnknownTag {
            tag: 0xfe,
            offset: 3,
            remaining: 2,
        };
        assert!(err.to_string().contains("0xfe"));

        let err = EncodeError::NoRecognizedAttributes;
        assert_eq!(err.to_string(), "no recognized control attributes");
    }
}
