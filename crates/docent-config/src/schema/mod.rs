//! Configuration schema types for Docent.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults that reproduce the stock
//! "chat with a PDF" setup.

mod chat;
mod document;
mod model;
mod system;

pub use chat::*;
pub use document::*;
pub use model::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Docent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocentConfig {
    pub model: ModelConfig,
    pub document: DocumentConfig,
    pub cache: CacheConfig,
    pub chat: ChatConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}
