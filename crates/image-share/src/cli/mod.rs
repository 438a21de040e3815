//! Subcommand implementations.

pub mod config;
pub mod photos;
pub mod run;

use image_share_core::{Config, ConfigError};
use std::path::{Path, PathBuf};

/// Config file the CLI reads: `--config` if given, otherwise the platform default.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Load configuration, falling back to defaults when no file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = config_path(explicit);
    if path.exists() {
        Config::load_from(&path)
    } else {
        Ok(Config::default())
    }
}

/// Configuration used at startup.
///
/// A broken file at the implicit default path falls back to defaults with a
/// warning. An explicitly chosen file must load, unless `lenient` is set for
/// commands that never touch the image directories.
pub fn load_startup_config(explicit: Option<&Path>, lenient: bool) -> Result<Config, ConfigError> {
    match load_config(explicit) {
        Ok(config) => Ok(config),
        Err(e) if lenient || explicit.is_none() => {
            // Logging isn't initialized yet, so use eprintln for config warnings.
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `image-share config path`."
            );
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}
