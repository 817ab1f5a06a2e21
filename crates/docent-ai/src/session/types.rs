//! In-flight send marker and query augmentation.

use std::sync::atomic::{AtomicBool, Ordering};

use docent_common::INPUT_PLACEHOLDER;

use crate::AiError;

/// Marks a session as having a send in flight for as long as it lives.
///
/// Dropping it frees the session for the next send, whether the send
/// completed or its future was abandoned mid-request.
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    /// Claim `busy`, or fail with [`AiError::Busy`] while another send holds it.
    pub(crate) fn claim(busy: &'a AtomicBool) -> Result<Self, AiError> {
        busy.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| Self(busy))
            .map_err(|_| AiError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Substitute `input` for every `{input}` in `template`.
///
/// A template without the placeholder gets the input appended after a space.
pub fn augment_query(template: &str, input: &str) -> String {
    if template.contains(INPUT_PLACEHOLDER) {
        template.replace(INPUT_PLACEHOLDER, input)
    } else if template.is_empty() {
        input.to_string()
    } else {
        format!("{template} {input}")
    }
}
