//! Environment layer: `.env` loading, credentials and overrides.
//!
//! Values from the environment always win over the config file. The API
//! key is only ever read from the environment.

use std::path::{Path, PathBuf};

use docent_common::ConfigError;
use tracing::{debug, info};

use crate::schema::DocentConfig;

/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Overrides `model.name` (and `model.fallback`).
pub const MODEL_VAR: &str = "DOCENT_MODEL";
/// Overrides `document.path`.
pub const DOCUMENT_VAR: &str = "DOCENT_DOCUMENT";

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
///
/// Surrounding quotes on the value are stripped.
pub fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Load environment variables from the first `.env` found in `candidates`.
///
/// Variables that are already set are left alone. Returns the file that
/// was loaded, if any.
pub fn load_dotenv_from(candidates: &[PathBuf]) -> Option<PathBuf> {
    for path in candidates {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        for (key, value) in parse_dotenv(&contents) {
            if std::env::var(&key).is_err() {
                std::env::set_var(&key, value);
            }
        }
        return Some(path.clone());
    }
    None
}

/// Load `.env` from the working directory, then the config directory.
pub fn load_dotenv() -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("docent").join(".env"));
    }
    load_dotenv_from(&candidates)
}

/// Read the API key from the process environment.
pub fn api_key() -> Result<String, ConfigError> {
    api_key_from(|key| std::env::var(key).ok())
}

/// Read the API key through `lookup`. Blank values count as missing.
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    lookup(API_KEY_VAR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(API_KEY_VAR.into()))
}

/// Apply `DOCENT_*` overrides from the process environment.
pub fn apply_env_overrides(config: &mut DocentConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply `DOCENT_*` overrides looked up through `lookup`.
pub fn apply_overrides_from(config: &mut DocentConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(model) = lookup(MODEL_VAR).filter(|v| !v.trim().is_empty()) {
        info!(model = %model, "model overridden from environment");
        config.model.name = model.clone();
        config.model.fallback = model;
    }
    if let Some(doc) = lookup(DOCUMENT_VAR).filter(|v| !v.trim().is_empty()) {
        debug!(document = %doc, "document overridden from environment");
        config.document.path = Some(PathBuf::from(doc));
    }
}

/// Resolve a possibly-relative document path against `root`.
pub fn resolve_document_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
