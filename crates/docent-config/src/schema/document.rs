//! Grounding document and context cache configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The reference document answers are grounded in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Local path of the document. Relative paths resolve against the
    /// working directory.
    pub path: Option<PathBuf>,
    /// When true, a missing document is fatal instead of falling back to
    /// an ungrounded model.
    pub required: bool,
    /// MIME type override. Guessed from the extension when unset.
    pub mime_type: Option<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("document.pdf")),
            required: false,
            mime_type: None,
        }
    }
}

/// Server-side context cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache lifetime in seconds (valid range: 60-86400).
    pub ttl_secs: u32,
    /// System instruction stored with the cached document.
    pub system_instruction: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            system_instruction: "You are an expert on the provided document. \
                I will ask you questions about specific topics or pages within it. \
                Use the information from the document to answer accurately."
                .into(),
        }
    }
}
