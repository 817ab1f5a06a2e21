//! The `docent` application: wiring config, client, resources and the
//! turn loop, with release guaranteed on every exit path.

pub mod repl;
pub mod setup;
pub mod signals;

#[cfg(test)]
mod tests;

use std::io::IsTerminal;
use std::sync::Arc;

use docent_ai::{
    AiError, ConversationSetup, GeminiClient, ModelClient, Orchestrator, ResourceManager,
    ToolRegistry,
};
use docent_common::DocentError;
use docent_config::DocentConfig;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::Args;

pub(crate) fn ai_error(e: AiError) -> DocentError {
    match e {
        AiError::Cancelled => DocentError::Interrupted,
        other => DocentError::Ai(other.to_string()),
    }
}

/// Run the whole program for `args` and `config`.
pub async fn run(
    args: &Args,
    config: DocentConfig,
    cancel: CancellationToken,
) -> Result<(), DocentError> {
    let api_key = docent_config::env::api_key()?;
    let root = std::env::current_dir()?;
    let config = setup::apply_cli_overrides(config, args.document.as_deref(), args.model.as_deref());

    let client: Arc<dyn ModelClient> = Arc::new(
        GeminiClient::new(setup::gemini_config(&config.model, api_key)).map_err(ai_error)?,
    );
    let tools = Arc::new(setup::tool_registry(&config.tools, &root, args.no_tools)?);
    let conversation = setup::conversation_setup(&config, &root);

    let mut resources = ResourceManager::new(client.clone());
    let result = converse(
        client,
        &mut resources,
        tools,
        &conversation,
        args.query.as_deref(),
        &cancel,
    )
    .await;

    // The turn loop has returned, so no send is in flight.
    resources.release().await;
    result
}

/// Prepare the conversation, then answer one query or read stdin.
pub async fn converse(
    client: Arc<dyn ModelClient>,
    resources: &mut ResourceManager,
    tools: Arc<ToolRegistry>,
    conversation: &ConversationSetup,
    query: Option<&str>,
    cancel: &CancellationToken,
) -> Result<(), DocentError> {
    let mut orchestrator = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(DocentError::Interrupted),
        prepared = Orchestrator::prepare(client, resources, tools, conversation) => {
            prepared.map_err(ai_error)?
        }
    };

    let mut stdout = std::io::stdout();
    let result = match query {
        Some(query) => repl::ask_once(&mut orchestrator, query, &mut stdout, cancel).await,
        None => {
            let stdin = tokio::io::stdin();
            let prompt = std::io::stdin().is_terminal();
            repl::run_repl(
                &mut orchestrator,
                BufReader::new(stdin),
                &mut stdout,
                prompt,
                cancel,
            )
            .await
        }
    };

    orchestrator.session().with_tracker(|usage| {
        let total = usage.total();
        info!(
            calls = usage.call_count(),
            input_tokens = total.input_tokens,
            cached_tokens = total.cached_tokens,
            output_tokens = total.output_tokens,
            total_tokens = usage.total_tokens(),
            cache_hit_ratio = usage.cache_hit_ratio(),
            "session usage"
        );
        for (model, used) in usage.models() {
            debug!(
                model,
                input_tokens = used.input_tokens,
                cached_tokens = used.cached_tokens,
                output_tokens = used.output_tokens,
                "model usage"
            );
        }
    });
    result
}
