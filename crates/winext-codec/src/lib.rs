//! WinExt node codec
//!
//! Decodes TLV telemetry frames from battery-powered sensor / actuator nodes
//! into named attributes, and encodes attribute changes into register write
//! frames sent back to the node.
//!
//! ## Architecture
//!
//! ```text
//! uplink bytes ──→ decode (tag registry) ──→ AttributeMap + errors/warnings
//!                     └─ register block ──→ decode_registers
//!
//! ControlRequest ──→ Encoder (address table) ──→ single / multi write frame
//!                                                  └─ checksum (CRC-16)
//! ```
//!
//! Every call is stateless: the only shared data are the static tables in
//! [`registry`]. Decode and encode never panic on bad input; problems are
//! returned in the outcome's `errors` (call failed) and `warnings` (partial
//! result) lists.

pub mod at_command;
pub mod checksum;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod registry;
pub mod value;

pub use at_command::AtCommand;
pub use checksum::checksum;
pub use config::CodecConfig;
pub use decode::{decode, decode_registers, DecodeOutcome, Decoder};
pub use encode::{
    encode, Channel, ControlRequest, EncodeOutcome, Encoder, FrameKind, OutboundFrame,
    RegisterWrite,
};
pub use error::{CodecError, CommandError, ConfigError, DecodeError, EncodeError, Result};
pub use value::{AttributeMap, AttributeValue};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
