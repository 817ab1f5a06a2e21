//! Where the config file lives, and writing a first one.

use std::path::{Path, PathBuf};

use docent_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "docent";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/docent/config.toml`.
///
/// On Linux that is `~/.config/docent/config.toml`; on macOS,
/// `~/Library/Application Support/docent/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))
}

/// Write the commented template to `path`, creating missing directories.
///
/// Overwrites whatever is there; callers check for an existing file first.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_error = |action: &str, e: std::io::Error| {
        ConfigError::ParseError(format!("cannot {action} {}: {e}", path.display()))
    };

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_error("create the directory for", e))?;
    }
    std::fs::write(path, default_config_toml()).map_err(|e| io_error("write", e))?;

    info!(path = %path.display(), "wrote default config");
    Ok(())
}
