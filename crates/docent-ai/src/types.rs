//! Conversation and resource data model shared by every component.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::tools::ToolDeclaration;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One piece of turn content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Reference to a previously uploaded file.
    FileData { uri: String, mime_type: String },
    /// A tool call issued by the model.
    FunctionCall(ToolInvocationRequest),
    /// The local result of a tool call, sent back to the model.
    FunctionResponse(ToolInvocationResult),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn file(doc: &UploadedDocument) -> Self {
        Part::FileData {
            uri: doc.uri.clone(),
            mime_type: doc.mime_type.clone(),
        }
    }
}

/// A role-tagged unit of conversation. Immutable once appended to history.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// Concatenation of every text part, or `None` when there is none.
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        let mut any = false;
        for part in &self.parts {
            if let Part::Text(t) = part {
                out.push_str(t);
                any = true;
            }
        }
        any.then_some(out)
    }

    /// Tool calls in part order.
    pub fn function_calls(&self) -> Vec<&ToolInvocationRequest> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }
}

/// A model-issued request to run a local tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    /// Call id, echoed back in the response when the service provides one.
    pub id: Option<String>,
    pub name: String,
    /// JSON object mapping argument names to values.
    pub args: serde_json::Value,
}

/// Outcome of a dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationResult {
    pub id: Option<String>,
    pub name: String,
    pub success: bool,
    /// Payload on success, error description on failure.
    pub content: String,
}

impl ToolInvocationResult {
    pub fn ok(request: &ToolInvocationRequest, payload: impl Into<String>) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            success: true,
            content: payload.into(),
        }
    }

    pub fn failed(request: &ToolInvocationRequest, error: impl Into<String>) -> Self {
        Self {
            id: request.id.clone(),
            name: request.name.clone(),
            success: false,
            content: error.into(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        (!self.success).then_some(self.content.as_str())
    }

    /// Structured body sent back to the model.
    pub fn to_response_json(&self) -> serde_json::Value {
        if self.success {
            serde_json::json!({ "success": true, "content": self.content })
        } else {
            serde_json::json!({ "success": false, "error": self.content })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub content: Option<Turn>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Prompt tokens served from the context cache.
    pub cached_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub candidates: Vec<Candidate>,
    pub usage: TokenUsage,
}

impl ModelResponse {
    /// Content of the first candidate, the one every caller acts on.
    pub fn first_content(&self) -> Option<&Turn> {
        self.candidates.first().and_then(|c| c.content.as_ref())
    }

    /// All text parts of the first candidate, concatenated.
    pub fn text(&self) -> Option<String> {
        self.first_content().and_then(Turn::text)
    }

    pub fn tool_calls(&self) -> Vec<&ToolInvocationRequest> {
        self.first_content()
            .map(Turn::function_calls)
            .unwrap_or_default()
    }
}

/// A document uploaded to the remote file store.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    /// Remote resource name, e.g. `files/abc123`.
    pub id: String,
    pub source_path: PathBuf,
    pub uri: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// What to put in a new server-side context cache.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub model: String,
    pub system_instruction: String,
    pub contents: Vec<Turn>,
    /// Tools must live in the cache: requests referencing a cache may not
    /// declare their own.
    pub tools: Vec<ToolDeclaration>,
    pub ttl: Option<Duration>,
}

/// A server-side context cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedContext {
    /// Remote resource name, e.g. `cachedContents/xyz`.
    pub id: String,
    pub model: String,
    pub system_instruction: String,
    pub contents: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// What a model handle generates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelBinding {
    Cached { cache_id: String, model: String },
    Named(String),
}

/// A conversational model: a binding plus the tools it may call.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    pub binding: ModelBinding,
    /// Declared per request. Ignored for cached bindings, whose tools were
    /// fixed when the cache was created.
    pub tools: Vec<ToolDeclaration>,
    /// Sent per request for named bindings; a cache carries its own.
    pub system_instruction: Option<String>,
}

impl ModelHandle {
    pub fn from_cache(cache: &CachedContext) -> Self {
        Self {
            binding: ModelBinding::Cached {
                cache_id: cache.id.clone(),
                model: cache.model.clone(),
            },
            tools: Vec::new(),
            system_instruction: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            binding: ModelBinding::Named(name.into()),
            tools: Vec::new(),
            system_instruction: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn model_name(&self) -> &str {
        match &self.binding {
            ModelBinding::Cached { model, .. } => model,
            ModelBinding::Named(name) => name,
        }
    }

    pub fn cache_id(&self) -> Option<&str> {
        match &self.binding {
            ModelBinding::Cached { cache_id, .. } => Some(cache_id),
            ModelBinding::Named(_) => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache_id().is_some()
    }
}
