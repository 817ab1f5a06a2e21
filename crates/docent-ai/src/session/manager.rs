//! ChatSession struct and history management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use docent_common::SessionId;
use tracing::debug;

use super::types::InFlight;
use crate::token_tracker::TokenTracker;
use crate::{AiError, ModelClient, ModelHandle, Turn};

/// A conversation bound to one model handle.
///
/// History only grows while a turn is in progress. A send appends nothing
/// until the model has answered, so a failed or cancelled send leaves it
/// untouched; a turn spanning several sends is undone with [`rollback_to`].
///
/// [`rollback_to`]: ChatSession::rollback_to
pub struct ChatSession {
    pub(super) id: SessionId,
    pub(super) client: Arc<dyn ModelClient>,
    pub(super) model: ModelHandle,
    pub(super) history: Mutex<Vec<Turn>>,
    /// Set once the seed history has been installed.
    pub(super) seeded: AtomicBool,
    pub(super) tracker: Mutex<TokenTracker>,
    /// Whether a send is in flight.
    pub(super) busy: AtomicBool,
}

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatSession {
    /// Start a session. A non-empty `seed` counts as the session's seeding.
    pub fn start(client: Arc<dyn ModelClient>, model: ModelHandle, seed: Vec<Turn>) -> Self {
        let id = SessionId::new();
        debug!(
            session = %id.as_str(),
            model = %model.model_name(),
            cached = model.is_cached(),
            seed_turns = seed.len(),
            "chat session started"
        );
        Self {
            id,
            client,
            model,
            seeded: AtomicBool::new(!seed.is_empty()),
            history: Mutex::new(seed),
            tracker: Mutex::new(TokenTracker::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Install the initial history. Allowed once, and only before the first send.
    pub fn seed(&self, turns: Vec<Turn>) -> Result<(), AiError> {
        let mut history = lock(&self.history);
        if !history.is_empty() || self.seeded.swap(true, Ordering::AcqRel) {
            return Err(AiError::AlreadySeeded);
        }
        *history = turns;
        Ok(())
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Snapshot of the history in chronological order.
    pub fn history(&self) -> Vec<Turn> {
        lock(&self.history).clone()
    }

    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    /// Drop every turn after the first `len`.
    pub(crate) fn rollback_to(&self, len: usize) {
        let mut history = lock(&self.history);
        if history.len() > len {
            debug!(
                session = %self.id.as_str(),
                dropped = history.len() - len,
                "history rolled back"
            );
            history.truncate(len);
        }
    }

    /// Append a user/model exchange that never went to the model.
    pub(crate) fn append_exchange(&self, user: Turn, model: Turn) -> Result<(), AiError> {
        let _guard = InFlight::claim(&self.busy)?;
        let mut history = lock(&self.history);
        history.push(user);
        history.push(model);
        Ok(())
    }

    /// Run `f` against the session's token tracker.
    pub fn with_tracker<R>(&self, f: impl FnOnce(&TokenTracker) -> R) -> R {
        f(&lock(&self.tracker))
    }
}
