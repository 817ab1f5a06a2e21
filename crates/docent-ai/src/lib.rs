//! Document-grounded chat engine for Docent.
//!
//! Provides:
//! - A `ModelClient` abstraction with a Gemini implementation
//!   (file upload, context caching, content generation)
//! - Ordered acquisition and release of the upload/cache resources
//! - Chat sessions with append-only history
//! - A tool registry that validates and dispatches model-issued calls
//! - The turn orchestrator tying them together

pub mod gemini;
pub mod orchestrator;
pub mod resources;
pub mod session;
pub mod token_tracker;
pub mod tools;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use std::path::Path;

use async_trait::async_trait;

pub use gemini::{GeminiClient, GeminiConfig};
pub use orchestrator::{ConversationSetup, Orchestrator, TurnOutcome, TurnState, NO_RESPONSE};
pub use resources::ResourceManager;
pub use session::{augment_query, ChatSession};
pub use token_tracker::TokenTracker;
pub use tools::{FileWriteTool, ParameterSchema, Tool, ToolDeclaration, ToolError, ToolRegistry};
pub use types::{
    CacheRequest, CachedContext, Candidate, ModelBinding, ModelHandle, ModelResponse, Part, Role,
    TokenUsage, ToolInvocationRequest, ToolInvocationResult, Turn, UploadedDocument,
};

/// Handle to the remote generation service.
///
/// Every method is a possibly slow remote call; callers race them against
/// a cancellation token when they need to abort.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Upload a local file to the remote file store.
    async fn upload_document(
        &self,
        path: &Path,
        mime_type: Option<&str>,
    ) -> Result<UploadedDocument, AiError>;

    async fn delete_document(&self, id: &str) -> Result<(), AiError>;

    async fn create_cached_context(&self, request: &CacheRequest)
        -> Result<CachedContext, AiError>;

    async fn delete_cached_context(&self, id: &str) -> Result<(), AiError>;

    /// Generate the next model turn for `contents`.
    async fn generate(
        &self,
        model: &ModelHandle,
        contents: &[Turn],
    ) -> Result<ModelResponse, AiError>;

    fn model_from_cache(&self, cache: &CachedContext) -> ModelHandle {
        ModelHandle::from_cache(cache)
    }

    fn model_by_name(&self, name: &str) -> ModelHandle {
        ModelHandle::by_name(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Cache creation failed: {0}")]
    CacheCreation(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Blocked by content policy: {0}")]
    ContentPolicy(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Session is busy with another request")]
    Busy,
    #[error("Session history has already been seeded")]
    AlreadySeeded,
    #[error("Cancelled")]
    Cancelled,
}

impl AiError {
    /// Whether a failed turn leaves the session usable for the next input.
    ///
    /// Rejected credentials, cancellation and resource-setup failures end
    /// the conversation; everything else is reported and the loop goes on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AiError::Auth(_) | AiError::Cancelled | AiError::Upload(_) | AiError::CacheCreation(_)
        )
    }
}
