//! Sending turns through the model client.

use tracing::{debug, warn};

use crate::{AiError, ModelResponse, Part, Role, Turn};

use super::manager::{lock, ChatSession};
use super::types::InFlight;

impl ChatSession {
    /// Send a text turn and return the model's response.
    pub async fn send(&self, text: impl Into<String>) -> Result<ModelResponse, AiError> {
        self.send_parts(vec![Part::text(text)]).await
    }

    /// Send a user turn made of `parts` (text or tool results).
    ///
    /// On success the user turn and the first candidate's content are
    /// appended, in that order. A response without candidates appends an
    /// empty model turn so history keeps alternating. Errors are not retried.
    pub async fn send_parts(&self, parts: Vec<Part>) -> Result<ModelResponse, AiError> {
        let _guard = InFlight::claim(&self.busy)?;

        let user_turn = Turn::new(Role::User, parts);
        let mut contents = self.history();
        contents.push(user_turn.clone());

        let response = match self.client.generate(&self.model, &contents).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session = %self.id.as_str(), error = %e, "send failed");
                return Err(e);
            }
        };

        lock(&self.tracker).record(self.model.model_name(), &response.usage);
        let model_turn = response
            .first_content()
            .cloned()
            .unwrap_or_else(|| Turn::new(Role::Model, Vec::new()));

        let mut history = lock(&self.history);
        history.push(user_turn);
        history.push(model_turn);
        debug!(
            session = %self.id.as_str(),
            history = history.len(),
            input_tokens = response.usage.input_tokens,
            cached_tokens = response.usage.cached_tokens,
            output_tokens = response.usage.output_tokens,
            "turn appended"
        );
        Ok(response)
    }
}
