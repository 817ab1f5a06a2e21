//! Reading queries and displaying answers.

use std::io::Write;

use docent_ai::{AiError, Orchestrator, TurnOutcome};
use docent_common::DocentError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ai_error;

/// One displayed result block.
pub fn render(outcome: &TurnOutcome) -> String {
    format!("Response: {}", outcome.text)
}

fn display(out: &mut impl Write, outcome: &TurnOutcome) -> Result<(), DocentError> {
    if outcome.truncated {
        warn!(rounds = outcome.tool_rounds, "answer cut short by the tool round limit");
    }
    writeln!(out, "{}", render(outcome))?;
    out.flush()?;
    Ok(())
}

/// Answer a single query. Every error is fatal here.
pub async fn ask_once(
    orchestrator: &mut Orchestrator,
    query: &str,
    out: &mut impl Write,
    cancel: &CancellationToken,
) -> Result<(), DocentError> {
    orchestrator.await_input();
    match orchestrator
        .handle_input(query, cancel)
        .await
        .map_err(ai_error)?
    {
        Some(outcome) => display(out, &outcome)?,
        None => warn!("empty query, nothing to ask"),
    }
    orchestrator.shutdown();
    Ok(())
}

/// Answer newline-delimited queries from `input` until end of input,
/// cancellation or an unrecoverable error.
pub async fn run_repl<R>(
    orchestrator: &mut Orchestrator,
    input: R,
    out: &mut impl Write,
    prompt: bool,
    cancel: &CancellationToken,
) -> Result<(), DocentError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        orchestrator.await_input();
        if prompt {
            eprint!("> ");
            std::io::stderr().flush()?;
        }

        let line = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("end of input");
            break;
        };

        match orchestrator.handle_input(&line, cancel).await {
            Ok(Some(outcome)) => display(out, &outcome)?,
            Ok(None) => {}
            Err(AiError::Cancelled) => break,
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "turn failed, waiting for next query");
                eprintln!("Error: {e}");
            }
            Err(e) => return Err(ai_error(e)),
        }
    }
    orchestrator.shutdown();
    Ok(())
}
