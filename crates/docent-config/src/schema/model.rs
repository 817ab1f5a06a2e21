//! Model selection and generation parameters.

use serde::{Deserialize, Serialize};

/// Which Gemini models to talk to and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model bound to the context cache. Caching requires a pinned version.
    pub name: String,
    /// Model used when no document (and therefore no cache) is available.
    pub fallback: String,
    /// Base URL of the generative language API.
    pub api_base: String,
    /// Valid range: 1-65536.
    pub max_tokens: u32,
    /// Valid range: 0.0-2.0.
    pub temperature: f64,
    /// Per-request timeout in seconds (valid range: 5-600).
    pub request_timeout_secs: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-1.5-flash-001".into(),
            fallback: "gemini-1.5-flash".into(),
            api_base: "https://generativelanguage.googleapis.com".into(),
            max_tokens: 4096,
            temperature: 0.7,
            request_timeout_secs: 120,
        }
    }
}
