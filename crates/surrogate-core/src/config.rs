//! Engine configuration.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding [`EngineConfig::call_base_by_default`].
pub const CALL_BASE_ENV: &str = "SURROGATE_CALL_BASE_BY_DEFAULT";

/// Settings applied to every router a factory builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Initial call-base-by-default flag of pure substitutes (partial and
    /// forwarding substitutes always call base by default)
    pub call_base_by_default: bool,
    /// Whether queued matchers must describe their parameter's declared type
    pub check_matcher_types: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_base_by_default: false,
            check_matcher_types: true,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document is not valid engine configuration.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(
            "Loaded engine config from {:?}: call_base_by_default={}, check_matcher_types={}",
            path,
            config.call_base_by_default,
            config.check_matcher_types
        );
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    /// Returns an error if an override variable holds an unrecognized value
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_call_base_override(env::var(CALL_BASE_ENV).ok().as_deref())
    }

    /// Apply a call-base-by-default override given as text.
    ///
    /// # Errors
    /// Returns an error if `raw` is not a recognized boolean
    pub fn with_call_base_override(mut self, raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(self);
        };
        self.call_base_by_default = match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(Error::Config(format!(
                    "{CALL_BASE_ENV} must be a boolean, got {other:?}"
                )));
            }
        };
        Ok(self)
    }
}
