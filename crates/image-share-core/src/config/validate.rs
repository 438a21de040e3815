//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_concurrent == 0 {
            return Err(ConfigError::ValidationError(
                "processing.max_concurrent must be > 0".into(),
            ));
        }
        if self.processing.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "processing.poll_interval_secs must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        for (name, dir) in [
            ("storage.raw_dir", &self.storage.raw_dir),
            ("storage.display_dir", &self.storage.display_dir),
            ("storage.failed_dir", &self.storage.failed_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}
