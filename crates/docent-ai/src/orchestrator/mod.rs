//! Turn orchestration: input → send → tool rounds → displayable result.

mod setup;
mod turn;


pub use setup::ConversationSetup;
pub use turn::Orchestrator;

use crate::ToolInvocationResult;

/// Displayed when the model returns no candidate text.
pub const NO_RESPONSE: &str = "No response from the model.";

/// Where the orchestrator is in a turn.
///
/// `Idle → AwaitingInput → Sending → {AwaitingToolResult → Sending} →
/// DisplayingResult → AwaitingInput`, with `ShuttingDown` reachable from
/// anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingInput,
    Sending,
    AwaitingToolResult,
    DisplayingResult,
    ShuttingDown,
}

/// Result of one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text to display: the concatenated text of the final response.
    pub text: String,
    /// Every tool result produced during the turn, in dispatch order.
    pub tool_results: Vec<ToolInvocationResult>,
    /// Continuation rounds spent on tool calls.
    pub tool_rounds: u32,
    /// True when the round limit stopped the turn with calls still pending.
    pub truncated: bool,
}
