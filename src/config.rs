//! Simulator configuration.
//!
//! Everything is optional; a missing field keeps the architecture default.
//!
//! ```json
//! { "memory_words": 131072, "stack_base": 49152, "max_ticks": 500000 }
//! ```

use crate::cpu::memory::{DEFAULT_MEMORY_WORDS, MAX_MEMORY_WORDS};
use crate::cpu::registers::{RegisterDefaults, DEFAULT_CONSTANT_POOL, DEFAULT_STACK_BASE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default tick budget for `run` from the command line.
pub const DEFAULT_MAX_TICKS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Main memory size in 32-bit words.
    pub memory_words: usize,
    /// Reset value of SP.
    pub stack_base: i32,
    /// Reset value of LV.
    pub local_base: i32,
    /// Reset value of CPP.
    pub constant_pool_base: i32,
    /// Tick budget for a bounded run.
    pub max_ticks: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            memory_words: DEFAULT_MEMORY_WORDS,
            stack_base: DEFAULT_STACK_BASE,
            local_base: DEFAULT_STACK_BASE,
            constant_pool_base: DEFAULT_CONSTANT_POOL,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl SimulatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_words == 0 {
            return Err(ConfigError::Invalid("memory_words must be at least 1".into()));
        }
        if self.memory_words > MAX_MEMORY_WORDS {
            return Err(ConfigError::Invalid(format!(
                "memory_words must be at most {MAX_MEMORY_WORDS} (32-bit byte addresses)"
            )));
        }
        Ok(())
    }

    pub fn register_defaults(&self) -> RegisterDefaults {
        RegisterDefaults {
            sp: self.stack_base,
            lv: self.local_base,
            cpp: self.constant_pool_base,
        }
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(String),

    #[error("cannot parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
