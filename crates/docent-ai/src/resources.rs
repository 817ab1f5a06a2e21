//! Ownership of the remote resources a conversation is grounded in.
//!
//! Resources are acquired in a fixed order (document, then cache) and
//! released in reverse. Release runs at most once no matter how many exit
//! paths reach it.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::tools::ToolDeclaration;
use crate::{
    AiError, CacheRequest, CachedContext, ModelClient, ModelHandle, Part, Role, Turn,
    UploadedDocument,
};

pub struct ResourceManager {
    client: Arc<dyn ModelClient>,
    document: Option<UploadedDocument>,
    cache: Option<CachedContext>,
    released: AtomicBool,
}

impl ResourceManager {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            document: None,
            cache: None,
            released: AtomicBool::new(false),
        }
    }

    /// Upload the grounding document if `path` exists locally.
    ///
    /// A path that does not exist is a valid fallback to an ungrounded model
    /// unless `required` is set. Any other problem with the path (not a
    /// file, unreadable metadata) is an upload failure.
    pub async fn acquire_document_if_present(
        &mut self,
        path: &Path,
        mime_type: Option<&str>,
        required: bool,
    ) -> Result<Option<UploadedDocument>, AiError> {
        if self.document.is_some() {
            return Ok(self.document.clone());
        }
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(AiError::Upload(format!(
                    "document is not a regular file: {}",
                    path.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if required {
                    return Err(AiError::Upload(format!(
                        "document not found: {}",
                        path.display()
                    )));
                }
                info!(path = %path.display(), "no document found, continuing without grounding");
                return Ok(None);
            }
            Err(e) => {
                return Err(AiError::Upload(format!(
                    "cannot access {}: {e}",
                    path.display()
                )));
            }
        }

        let document = self.client.upload_document(path, mime_type).await?;
        info!(id = %document.id, path = %path.display(), "document uploaded");
        self.document = Some(document.clone());
        Ok(Some(document))
    }

    /// Create a context cache over the acquired document.
    ///
    /// Does nothing when no document was acquired. Failure is propagated
    /// and never retried.
    pub async fn acquire_cache_if_applicable(
        &mut self,
        model: &str,
        system_instruction: &str,
        tools: Vec<ToolDeclaration>,
        ttl: Option<Duration>,
    ) -> Result<Option<CachedContext>, AiError> {
        let Some(document) = &self.document else {
            debug!("no document, skipping context cache");
            return Ok(None);
        };
        if self.cache.is_some() {
            return Ok(self.cache.clone());
        }

        let request = CacheRequest {
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
            contents: vec![Turn::new(Role::User, vec![Part::file(document)])],
            tools,
            ttl,
        };
        let cache = self.client.create_cached_context(&request).await?;
        info!(id = %cache.id, model = %cache.model, "context cache created");
        self.cache = Some(cache.clone());
        Ok(Some(cache))
    }

    /// Model bound to the cache when one exists, else to `fallback_model`.
    ///
    /// `tools` only apply to the uncached binding; a cache already carries
    /// the tools it was created with.
    pub fn model_handle(&self, fallback_model: &str, tools: Vec<ToolDeclaration>) -> ModelHandle {
        match &self.cache {
            Some(cache) => self.client.model_from_cache(cache),
            None => self.client.model_by_name(fallback_model).with_tools(tools),
        }
    }

    /// Attach the document to `seed` when it is not already in a cache.
    ///
    /// The file reference goes in front of the first user turn, or into a
    /// new leading user turn when the seed has none.
    pub fn ground_seed(&self, mut seed: Vec<Turn>) -> Vec<Turn> {
        let Some(document) = &self.document else {
            return seed;
        };
        if self.cache.is_some() {
            return seed;
        }
        match seed.iter_mut().find(|t| t.role == Role::User) {
            Some(turn) => turn.parts.insert(0, Part::file(document)),
            None => seed.insert(0, Turn::new(Role::User, vec![Part::file(document)])),
        }
        seed
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    pub fn cache(&self) -> Option<&CachedContext> {
        self.cache.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Delete the cache, then the document.
    ///
    /// Deletion failures are logged and teardown continues. Only the first
    /// call does any work.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!("resources already released");
            return;
        }

        if let Some(cache) = &self.cache {
            match self.client.delete_cached_context(&cache.id).await {
                Ok(()) => info!(id = %cache.id, "context cache deleted"),
                Err(e) => warn!(id = %cache.id, error = %e, "failed to delete context cache"),
            }
        }
        if let Some(document) = &self.document {
            match self.client.delete_document(&document.id).await {
                Ok(()) => info!(id = %document.id, "document deleted"),
                Err(e) => warn!(id = %document.id, error = %e, "failed to delete document"),
            }
        }
    }
}
