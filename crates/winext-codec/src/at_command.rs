//! AT commands for the node configuration channel.
//!
//! Commands are plain ASCII lines: `AT+NAME=value\n` sets, `AT+NAME?\n`
//! queries and `AT+NAME\n` executes.

use std::fmt;

use crate::encode::{Channel, FrameKind, OutboundFrame};
use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtCommand {
    Set { name: String, value: String },
    Query { name: String },
    Execute { name: String },
}

impl AtCommand {
    pub fn set(name: impl Into<String>, value: impl fmt::Display) -> Result<Self, CommandError> {
        let name = validate_name(name.into())?;
        let value = value.to_string();
        if value.contains(['\r', '\n']) {
            return Err(CommandError::InvalidArgument);
        }
        Ok(Self::Set { name, value })
    }

    pub fn query(name: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self::Query {
            name: validate_name(name.into())?,
        })
    }

    pub fn execute(name: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self::Execute {
            name: validate_name(name.into())?,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Query { name } | Self::Execute { name } => name,
        }
    }

    /// Frame for the configuration channel.
    pub fn to_frame(&self) -> OutboundFrame {
        OutboundFrame {
            channel: Channel::Config,
            kind: FrameKind::Command,
            bytes: self.to_string().into_bytes(),
        }
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set { name, value } => writeln!(f, "AT+{}={}", name, value),
            Self::Query { name } => writeln!(f, "AT+{}?", name),
            Self::Execute { name } => writeln!(f, "AT+{}", name),
        }
    }
}

/// Names are upper-case ASCII letters, digits and underscores.
fn validate_name(name: String) -> Result<String, CommandError> {
    let name = name.trim().to_ascii_uppercase();
    if name.is_empty() {
        return Err(CommandError::EmptyName);
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(CommandError::InvalidName { name, ch });
    }
    Ok(name)
}
