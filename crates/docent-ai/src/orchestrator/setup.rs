//! Building an orchestrator from acquired resources.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::Orchestrator;
use crate::resources::ResourceManager;
use crate::session::ChatSession;
use crate::tools::ToolRegistry;
use crate::{AiError, ModelClient, Turn};

/// Everything needed to ground and start a conversation.
#[derive(Debug, Clone)]
pub struct ConversationSetup {
    /// Local grounding document. `None` runs ungrounded.
    pub document: Option<PathBuf>,
    pub mime_type: Option<String>,
    /// Treat a missing document as fatal.
    pub document_required: bool,
    /// Model the cache is created for.
    pub model: String,
    /// Model used when no cache exists.
    pub fallback_model: String,
    pub cache_enabled: bool,
    pub cache_ttl: Option<Duration>,
    pub system_instruction: String,
    pub seed: Vec<Turn>,
    pub query_template: String,
    pub max_tool_rounds: u32,
}

impl Orchestrator {
    /// Acquire the document and cache through `resources`, then start a
    /// seeded session on the resulting model.
    ///
    /// On error, whatever was acquired stays in `resources` for the caller
    /// to release.
    pub async fn prepare(
        client: Arc<dyn ModelClient>,
        resources: &mut ResourceManager,
        tools: Arc<ToolRegistry>,
        setup: &ConversationSetup,
    ) -> Result<Self, AiError> {
        match &setup.document {
            Some(path) => {
                resources
                    .acquire_document_if_present(
                        path,
                        setup.mime_type.as_deref(),
                        setup.document_required,
                    )
                    .await?;
            }
            None if setup.document_required => {
                return Err(AiError::Upload("no document configured".into()));
            }
            None => {}
        }

        if setup.cache_enabled {
            resources
                .acquire_cache_if_applicable(
                    &setup.model,
                    &setup.system_instruction,
                    tools.declarations(),
                    setup.cache_ttl,
                )
                .await?;
        }

        let mut handle = resources.model_handle(&setup.fallback_model, tools.declarations());
        if !handle.is_cached() {
            handle = handle.with_system_instruction(setup.system_instruction.clone());
        }
        info!(
            model = %handle.model_name(),
            cached = handle.is_cached(),
            grounded = resources.document().is_some(),
            tools = tools.len(),
            "conversation ready"
        );

        let seed = resources.ground_seed(setup.seed.clone());
        let session = ChatSession::start(client, handle, seed);
        Ok(Orchestrator::new(session, tools)
            .with_query_template(setup.query_template.clone())
            .with_max_tool_rounds(setup.max_tool_rounds))
    }
}
