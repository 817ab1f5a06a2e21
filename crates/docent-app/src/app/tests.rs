use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docent_ai::{
    AiError, CacheRequest, CachedContext, Candidate, ChatSession, ModelClient, ModelHandle,
    ModelResponse, Orchestrator, ToolRegistry, Turn, TurnOutcome, UploadedDocument,
};
use docent_common::DocentError;
use tokio_util::sync::CancellationToken;

use super::repl::{ask_once, render, run_repl};
use super::*;

/// Replies `echo: <last user text>` unless an error is queued.
#[derive(Default)]
struct EchoClient {
    errors: Mutex<VecDeque<AiError>>,
    generated: Mutex<usize>,
}

impl EchoClient {
    fn failing_with(errors: Vec<AiError>) -> Self {
        Self {
            errors: Mutex::new(errors.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ModelClient for EchoClient {
    async fn upload_document(
        &self,
        _path: &Path,
        _mime_type: Option<&str>,
    ) -> Result<UploadedDocument, AiError> {
        Err(AiError::Upload("not supported".into()))
    }

    async fn delete_document(&self, _id: &str) -> Result<(), AiError> {
        Ok(())
    }

    async fn create_cached_context(
        &self,
        _request: &CacheRequest,
    ) -> Result<CachedContext, AiError> {
        Err(AiError::CacheCreation("not supported".into()))
    }

    async fn delete_cached_context(&self, _id: &str) -> Result<(), AiError> {
        Ok(())
    }

    async fn generate(
        &self,
        _model: &ModelHandle,
        contents: &[Turn],
    ) -> Result<ModelResponse, AiError> {
        *self.generated.lock().unwrap() += 1;
        if let Some(err) = self.errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let last = contents.last().and_then(Turn::text).unwrap_or_default();
        Ok(ModelResponse {
            candidates: vec![Candidate {
                content: Some(Turn::model_text(format!("echo: {last}"))),
                finish_reason: Some("STOP".into()),
            }],
            usage: Default::default(),
        })
    }
}

fn orchestrator(client: Arc<EchoClient>) -> Orchestrator {
    let session = ChatSession::start(client, ModelHandle::by_name("m"), Vec::new());
    Orchestrator::new(session, Arc::new(ToolRegistry::new())).with_query_template("{input}")
}

fn output(out: Vec<u8>) -> Vec<String> {
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn render_prefixes_response() {
    let outcome = TurnOutcome {
        text: "42".into(),
        tool_results: Vec::new(),
        tool_rounds: 0,
        truncated: false,
    };
    assert_eq!(render(&outcome), "Response: 42");
}

#[test]
fn cancellation_maps_to_interrupted() {
    assert!(matches!(ai_error(AiError::Cancelled), DocentError::Interrupted));
    assert!(matches!(ai_error(AiError::Timeout), DocentError::Ai(_)));
}

#[tokio::test]
async fn repl_answers_each_line_and_skips_blanks() {
    let client = Arc::new(EchoClient::default());
    let mut orch = orchestrator(client.clone());
    let mut out = Vec::new();

    run_repl(
        &mut orch,
        &b"first\n\n   \nsecond\n"[..],
        &mut out,
        false,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        output(out),
        vec!["Response: echo: first", "Response: echo: second"]
    );
    assert_eq!(*client.generated.lock().unwrap(), 2);
    assert_eq!(orch.state(), docent_ai::TurnState::ShuttingDown);
}

#[tokio::test]
async fn repl_continues_after_recoverable_error() {
    let client = Arc::new(EchoClient::failing_with(vec![AiError::RateLimited]));
    let mut orch = orchestrator(client);
    let mut out = Vec::new();

    run_repl(&mut orch, &b"one\ntwo\n"[..], &mut out, false, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output(out), vec!["Response: echo: two"]);
}

#[tokio::test]
async fn repl_stops_on_unrecoverable_error() {
    let client = Arc::new(EchoClient::failing_with(vec![AiError::Auth("revoked".into())]));
    let mut orch = orchestrator(client.clone());
    let mut out = Vec::new();

    let err = run_repl(&mut orch, &b"one\ntwo\n"[..], &mut out, false, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DocentError::Ai(_)));
    assert!(out.is_empty());
    assert_eq!(*client.generated.lock().unwrap(), 1);
}

#[tokio::test]
async fn repl_returns_immediately_when_cancelled() {
    let client = Arc::new(EchoClient::default());
    let mut orch = orchestrator(client.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut out = Vec::new();

    run_repl(&mut orch, &b"one\n"[..], &mut out, false, &cancel)
        .await
        .unwrap();
    assert!(out.is_empty());
    assert_eq!(*client.generated.lock().unwrap(), 0);
}

#[tokio::test]
async fn one_shot_query_prints_one_block() {
    let client = Arc::new(EchoClient::default());
    let mut orch = orchestrator(client);
    let mut out = Vec::new();

    ask_once(&mut orch, "what is X?", &mut out, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output(out), vec!["Response: echo: what is X?"]);
}

#[tokio::test]
async fn converse_releases_nothing_without_a_document() {
    let client: Arc<dyn ModelClient> = Arc::new(EchoClient::default());
    let mut resources = ResourceManager::new(client.clone());
    let dir = tempfile::tempdir().unwrap();
    let mut config = DocentConfig::default();
    config.document.path = Some(dir.path().join("absent.pdf"));
    let conversation = setup::conversation_setup(&config, dir.path());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = converse(
        client,
        &mut resources,
        Arc::new(ToolRegistry::new()),
        &conversation,
        Some("q"),
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DocentError::Interrupted));

    resources.release().await;
    assert!(resources.document().is_none());
    assert!(resources.is_released());
}
