//! knobs for a single analysis run. a config is built once, before any path is explored, and is
//! handed around by reference afterward.

use error::{Error, Result};

/// which `CCall` arguments contribute their side conditions to the translated helper call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CCallConstraintPolicy {
    /// only the first argument's constraints are kept. this is the historical behavior and the
    /// default.
    FirstArgument,
    /// constraints from every argument are kept, in argument order.
    AllArguments,
}

impl Default for CCallConstraintPolicy {
    fn default() -> Self {
        CCallConstraintPolicy::FirstArgument
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ccall_constraints: CCallConstraintPolicy,
    /// longest string, in bytes, that `strlen`-like summaries will scan for a terminator.
    pub max_str_len: u32,
    /// how far past `max_str_len` a scan continues while every byte it has read is concrete.
    pub max_concrete_str_len: u32,
    /// bytes recorded for a `write` whose length is symbolic.
    pub max_buffer_bytes: u32,
    /// largest concrete `write` length that is recorded in full. longer writes are errors.
    pub max_write_bytes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            ccall_constraints: CCallConstraintPolicy::default(),
            max_str_len: 128,
            max_concrete_str_len: 1 << 16,
            max_buffer_bytes: 256,
            max_write_bytes: 1 << 20,
        }
    }
}

impl EngineConfig {
    /// parse a config from JSON. missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<EngineConfig> {
        serde_json::from_str(text).map_err(Error::Config)
    }
}
