//! Gemini API client configuration.

use std::time::Duration;

pub(crate) const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini API client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub request_timeout: Duration,
    /// Delay between checks while an upload is still being processed.
    pub upload_poll_interval: Duration,
    /// Checks before giving up on an upload that never becomes active.
    pub upload_poll_attempts: u32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
            upload_poll_interval: Duration::from_secs(2),
            upload_poll_attempts: 30,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_upload_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.upload_poll_interval = interval;
        self.upload_poll_attempts = attempts;
        self
    }
}
