// Kernel configuration

use super::constants::{ENV_CATCH_PANICS, ENV_WARN_ON_HALT};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Execution kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Turn panics inside perform into `JobError::Panicked`
    pub catch_panics: bool,

    /// Log a warning when a callback halts the perform chain
    pub warn_on_halt: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            warn_on_halt: true,
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by `JOBRUN_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_CATCH_PANICS) {
            config.catch_panics = parse_flag(ENV_CATCH_PANICS, &value)?;
        }
        if let Some(value) = lookup(ENV_WARN_ON_HALT) {
            config.warn_on_halt = parse_flag(ENV_WARN_ON_HALT, &value)?;
        }
        Ok(config)
    }

    /// Parse a JSON config document; missing fields keep their defaults
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
