//! Docent configuration system.
//!
//! Provides TOML-based configuration with validation and an environment
//! layer on top. All config sections use defaults so partial configs work
//! out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = docent_config::load_config(None).expect("failed to load config");
//! println!("{}", config.model.name);
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{DocentConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use docent_common::ConfigError;

/// Load config from `path`, or from the platform default path when `None`,
/// then apply environment overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<DocentConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    env::apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tools]\nenabled = false\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.tools.enabled);
    }

    #[test]
    fn load_config_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
