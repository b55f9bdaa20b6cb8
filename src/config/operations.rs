//! Config loading, validation, and conversion helpers.

use super::model::LockConfig;
use crate::error::{LockError, Result};
use std::path::Path;
use std::time::Duration;

impl LockConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(LockConfig)` - Successfully loaded and validated config
    /// * `Err(LockError::Io)` - The file could not be read
    /// * `Err(LockError::Config)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::io(
                format!("failed to read config file '{}'", path.display()),
                e,
            )
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document means all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: LockConfig = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `poll_interval_ms` must be positive (acquire never busy-spins)
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(LockError::Config(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The acquire timeout, `None` meaning wait forever.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The sleep between acquisition attempts.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
