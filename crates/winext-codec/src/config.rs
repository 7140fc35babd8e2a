//! Codec configuration.
//!
//! Values come from defaults, then an optional TOML file, then environment
//! variables (highest priority).
//!
//! ```toml
//! max_frame_len = 242
//! uplink_port = 210
//! node_id = 1
//! consolidate_writes = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default values.
pub mod defaults {
    /// Largest LoRaWAN application payload.
    pub const MAX_FRAME_LEN: usize = 242;
    /// Application port that carries TLV telemetry.
    pub const UPLINK_PORT: u8 = 210;
    pub const NODE_ID: u8 = 1;
    pub const CONSOLIDATE_WRITES: bool = true;
}

/// Environment variable names.
pub mod env_vars {
    pub const MAX_FRAME_LEN: &str = "WINEXT_MAX_FRAME_LEN";
    pub const UPLINK_PORT: &str = "WINEXT_UPLINK_PORT";
    pub const NODE_ID: &str = "WINEXT_NODE_ID";
    pub const CONSOLIDATE_WRITES: &str = "WINEXT_CONSOLIDATE_WRITES";
}

/// Decoder / encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Longer uplink buffers are rejected before decoding.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,

    /// Application port carrying TLV frames.
    #[serde(default = "default_uplink_port")]
    pub uplink_port: u8,

    /// Node identifier byte written into multi-register frames.
    #[serde(default = "default_node_id")]
    pub node_id: u8,

    /// Allow several contiguous registers in one write.
    #[serde(default = "default_consolidate_writes")]
    pub consolidate_writes: bool,
}

fn default_max_frame_len() -> usize {
    defaults::MAX_FRAME_LEN
}
fn default_uplink_port() -> u8 {
    defaults::UPLINK_PORT
}
fn default_node_id() -> u8 {
    defaults::NODE_ID
}
fn default_consolidate_writes() -> bool {
    defaults::CONSOLIDATE_WRITES
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_len: default_max_frame_len(),
            uplink_port: default_uplink_port(),
            node_id: default_node_id(),
            consolidate_writes: default_consolidate_writes(),
        }
    }
}

impl CodecConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)?.with_env_overrides()
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `WINEXT_*` environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = lookup(env_vars::MAX_FRAME_LEN) {
            self.max_frame_len = parse_env(env_vars::MAX_FRAME_LEN, &v)?;
        }
        if let Some(v) = lookup(env_vars::UPLINK_PORT) {
            self.uplink_port = parse_env(env_vars::UPLINK_PORT, &v)?;
        }
        if let Some(v) = lookup(env_vars::NODE_ID) {
            self.node_id = parse_env(env_vars::NODE_ID, &v)?;
        }
        if let Some(v) = lookup(env_vars::CONSOLIDATE_WRITES) {
            self.consolidate_writes = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: env_vars::CONSOLIDATE_WRITES,
                        value: v,
                    })
                }
            };
        }
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
