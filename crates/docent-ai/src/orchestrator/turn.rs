//! The turn loop.

use std::sync::Arc;

use docent_common::new_correlation_id;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::{TurnOutcome, TurnState, NO_RESPONSE};
use crate::session::{augment_query, ChatSession};
use crate::tools::ToolRegistry;
use crate::{AiError, ModelResponse, Part, Role, ToolInvocationResult, Turn};

const DEFAULT_QUERY_TEMPLATE: &str = "Using the referenced document, {input}";
const DEFAULT_MAX_TOOL_ROUNDS: u32 = 10;
/// Answer recorded for tool calls left pending at the round limit.
pub(crate) const TOOL_LIMIT_REACHED: &str = "tool round limit reached";

/// Drives a [`ChatSession`] one user input at a time.
pub struct Orchestrator {
    session: ChatSession,
    tools: Arc<ToolRegistry>,
    query_template: String,
    max_tool_rounds: u32,
    state: TurnState,
}

impl Orchestrator {
    pub fn new(session: ChatSession, tools: Arc<ToolRegistry>) -> Self {
        Self {
            session,
            tools,
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            state: TurnState::Idle,
        }
    }

    pub fn with_query_template(mut self, template: impl Into<String>) -> Self {
        self.query_template = template.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Mark the orchestrator ready for the next line of input.
    pub fn await_input(&mut self) {
        if self.state != TurnState::ShuttingDown {
            self.state = TurnState::AwaitingInput;
        }
    }

    pub fn shutdown(&mut self) {
        self.state = TurnState::ShuttingDown;
    }

    /// Run one turn for `line`.
    ///
    /// Blank input is skipped (`Ok(None)`) without touching the session.
    /// A failed turn leaves no trace in history, tool rounds included.
    /// Recoverable errors leave the orchestrator awaiting input; anything
    /// else, cancellation included, moves it to `ShuttingDown`.
    pub async fn handle_input(
        &mut self,
        line: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TurnOutcome>, AiError> {
        if self.state == TurnState::ShuttingDown || cancel.is_cancelled() {
            self.state = TurnState::ShuttingDown;
            return Err(AiError::Cancelled);
        }
        let input = line.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let checkpoint = self.session.history_len();
        let span = info_span!("turn", id = %new_correlation_id());
        let result = self.run_turn(input, cancel).instrument(span).await;
        if result.is_err() {
            // History holds whole turns only.
            self.session.rollback_to(checkpoint);
        }
        match &result {
            Ok(_) => self.state = TurnState::DisplayingResult,
            Err(e) if e.is_recoverable() => self.state = TurnState::AwaitingInput,
            Err(_) => self.state = TurnState::ShuttingDown,
        }
        result.map(Some)
    }

    async fn run_turn(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, AiError> {
        let query = augment_query(&self.query_template, input);
        debug!(query = %query, "sending query");

        self.state = TurnState::Sending;
        let mut response = self.send(vec![Part::text(query)], cancel).await?;

        let mut tool_results = Vec::new();
        let mut rounds = 0;
        let mut truncated = false;
        loop {
            let calls: Vec<_> = response.tool_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                break;
            }
            if rounds >= self.max_tool_rounds {
                warn!(rounds, pending = calls.len(), "tool round limit reached");
                let declined = calls
                    .iter()
                    .map(|call| ToolInvocationResult::failed(call, TOOL_LIMIT_REACHED))
                    .map(Part::FunctionResponse)
                    .collect();
                self.session.append_exchange(
                    Turn::new(Role::User, declined),
                    Turn::model_text(TOOL_LIMIT_REACHED),
                )?;
                truncated = true;
                break;
            }
            rounds += 1;

            self.state = TurnState::AwaitingToolResult;
            let mut parts = Vec::with_capacity(calls.len());
            for call in &calls {
                if cancel.is_cancelled() {
                    return Err(AiError::Cancelled);
                }
                info!(tool = %call.name, round = rounds, "dispatching tool call");
                let result = self.tools.dispatch(call).await;
                parts.push(Part::FunctionResponse(result.clone()));
                tool_results.push(result);
            }

            self.state = TurnState::Sending;
            response = self.send(parts, cancel).await?;
        }

        Ok(TurnOutcome {
            text: response.text().unwrap_or_else(|| NO_RESPONSE.to_string()),
            tool_results,
            tool_rounds: rounds,
            truncated,
        })
    }

    /// Send `parts`, abandoning the request if `cancel` fires first.
    async fn send(
        &self,
        parts: Vec<Part>,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse, AiError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("send cancelled");
                Err(AiError::Cancelled)
            }
            result = self.session.send_parts(parts) => result,
        }
    }
}
