//! Scripted in-memory `ModelClient` for tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::{
    AiError, CacheRequest, CachedContext, Candidate, ModelClient, ModelHandle, ModelResponse, Part,
    Role, TokenUsage, ToolInvocationRequest, Turn, UploadedDocument,
};

/// A remote call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(PathBuf),
    DeleteDocument(String),
    CreateCache { model: String, tools: Vec<String> },
    DeleteCache(String),
    Generate {
        cache_id: Option<String>,
        model: String,
        contents: Vec<Turn>,
    },
}

#[derive(Default)]
pub struct MockClient {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<Result<ModelResponse, AiError>>>,
    fail_cache: bool,
    fail_deletes: bool,
    hang_generate: bool,
}

pub const DOC_ID: &str = "files/doc-1";
pub const CACHE_ID: &str = "cachedContents/cache-1";

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses handed out by `generate`, in order.
    pub fn with_responses(self, responses: Vec<Result<ModelResponse, AiError>>) -> Self {
        *self.responses.lock().unwrap() = responses.into();
        self
    }

    pub fn failing_cache(mut self) -> Self {
        self.fail_cache = true;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// `generate` never completes.
    pub fn hanging(mut self) -> Self {
        self.hang_generate = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the delete calls, in issue order.
    pub fn deletes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DeleteDocument(_) | Call::DeleteCache(_)))
            .collect()
    }

    pub fn generate_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Generate { .. }))
            .count()
    }

    /// Contents of the last `generate` call.
    pub fn last_contents(&self) -> Vec<Turn> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                Call::Generate { contents, .. } => Some(contents),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ModelClient for MockClient {
    async fn upload_document(
        &self,
        path: &Path,
        mime_type: Option<&str>,
    ) -> Result<UploadedDocument, AiError> {
        self.record(Call::Upload(path.to_path_buf()));
        Ok(UploadedDocument {
            id: DOC_ID.into(),
            source_path: path.to_path_buf(),
            uri: format!("https://files.example/{DOC_ID}"),
            mime_type: mime_type.unwrap_or("application/pdf").into(),
            uploaded_at: Utc::now(),
        })
    }

    async fn delete_document(&self, id: &str) -> Result<(), AiError> {
        self.record(Call::DeleteDocument(id.into()));
        if self.fail_deletes {
            return Err(AiError::NetworkError("connection reset".into()));
        }
        Ok(())
    }

    async fn create_cached_context(
        &self,
        request: &CacheRequest,
    ) -> Result<CachedContext, AiError> {
        self.record(Call::CreateCache {
            model: request.model.clone(),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
        });
        if self.fail_cache {
            return Err(AiError::CacheCreation("quota exceeded".into()));
        }
        Ok(CachedContext {
            id: CACHE_ID.into(),
            model: request.model.clone(),
            system_instruction: request.system_instruction.clone(),
            contents: request.contents.clone(),
            created_at: Utc::now(),
            expires_at: None,
        })
    }

    async fn delete_cached_context(&self, id: &str) -> Result<(), AiError> {
        self.record(Call::DeleteCache(id.into()));
        if self.fail_deletes {
            return Err(AiError::NetworkError("connection reset".into()));
        }
        Ok(())
    }

    async fn generate(
        &self,
        model: &ModelHandle,
        contents: &[Turn],
    ) -> Result<ModelResponse, AiError> {
        self.record(Call::Generate {
            cache_id: model.cache_id().map(String::from),
            model: model.model_name().to_string(),
            contents: contents.to_vec(),
        });
        if self.hang_generate {
            std::future::pending::<()>().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(text_response("Default response")))
    }
}

pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        candidates: vec![Candidate {
            content: Some(Turn::model_text(text)),
            finish_reason: Some("STOP".into()),
        }],
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            cached_tokens: 0,
        },
    }
}

pub fn tool_call_response(calls: Vec<(&str, Value)>) -> ModelResponse {
    let parts = calls
        .into_iter()
        .map(|(name, args)| {
            Part::FunctionCall(ToolInvocationRequest {
                id: None,
                name: name.into(),
                args,
            })
        })
        .collect();
    ModelResponse {
        candidates: vec![Candidate {
            content: Some(Turn::new(Role::Model, parts)),
            finish_reason: Some("STOP".into()),
        }],
        usage: TokenUsage::default(),
    }
}
