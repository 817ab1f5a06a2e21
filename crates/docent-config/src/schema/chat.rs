//! Chat session and tool configuration.

use serde::{Deserialize, Serialize};

pub use docent_common::INPUT_PLACEHOLDER;

/// Speaker of a seeded turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedRole {
    User,
    Model,
}

/// One turn of the history a session starts with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedTurn {
    pub role: SeedRole,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Wrapper applied to every user query. Must contain `{input}`.
    pub query_template: String,
    /// History the session is seeded with before the first query.
    pub seed_history: Vec<SeedTurn>,
    /// Maximum tool-call round trips per turn (valid range: 1-50).
    pub max_tool_rounds: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            query_template: "Using the referenced document, {input}".into(),
            seed_history: vec![
                SeedTurn {
                    role: SeedRole::User,
                    text: "Hello, I have loaded a document. Please help me understand its contents."
                        .into(),
                },
                SeedTurn {
                    role: SeedRole::Model,
                    text: "I'll help you understand the document. What would you like to know about it?"
                        .into(),
                },
            ],
            max_tool_rounds: 10,
        }
    }
}

/// Locally executed tools the model may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub enabled: bool,
    /// Sandbox directory for written files, relative to the working directory.
    pub output_dir: String,
    /// Extension appended to every written file name.
    pub extension: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: "results".into(),
            extension: "txt".into(),
        }
    }
}
