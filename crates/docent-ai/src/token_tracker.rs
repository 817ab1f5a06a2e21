//! Token usage tracking per model.

use std::collections::HashMap;

use crate::TokenUsage;

/// Tracks cumulative token usage per model and across the session.
pub struct TokenTracker {
    /// Total usage across all models.
    total: TokenUsage,
    /// Usage broken down by model name.
    by_model: HashMap<String, TokenUsage>,
    /// Number of generate calls made.
    call_count: u64,
}

fn accumulate(into: &mut TokenUsage, usage: &TokenUsage) {
    into.input_tokens = into.input_tokens.saturating_add(usage.input_tokens);
    into.output_tokens = into.output_tokens.saturating_add(usage.output_tokens);
    into.cached_tokens = into.cached_tokens.saturating_add(usage.cached_tokens);
}

impl TokenTracker {
    pub fn new() -> Self {
        Self {
            total: TokenUsage::default(),
            by_model: HashMap::new(),
            call_count: 0,
        }
    }

    /// Record token usage from one generate call.
    pub fn record(&mut self, model: &str, usage: &TokenUsage) {
        accumulate(&mut self.total, usage);
        accumulate(self.by_model.entry(model.to_string()).or_default(), usage);
        self.call_count += 1;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    /// Usage per model name, in no particular order.
    pub fn models(&self) -> impl Iterator<Item = (&str, &TokenUsage)> {
        self.by_model.iter().map(|(name, usage)| (name.as_str(), usage))
    }

    /// Input plus output tokens.
    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    /// Share of input tokens served from the context cache, in `0.0..=1.0`.
    pub fn cache_hit_ratio(&self) -> f64 {
        if self.total.input_tokens == 0 {
            return 0.0;
        }
        self.total.cached_tokens as f64 / self.total.input_tokens as f64
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }
}

impl Default for TokenTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(input: u64, output: u64, cached: u64) -> TokenUsage {
        TokenUsage {
            input_tokens: input,
            output_tokens: output,
            cached_tokens: cached,
        }
    }

    #[test]
    fn records_per_model_and_total() {
        let mut tracker = TokenTracker::new();
        tracker.record("gemini-1.5-flash-001", &usage(100, 20, 80));
        tracker.record("gemini-1.5-flash-001", &usage(50, 10, 40));
        tracker.record("gemini-1.5-flash", &usage(10, 5, 0));

        assert_eq!(tracker.call_count(), 3);
        assert_eq!(tracker.total(), &usage(160, 35, 120));
        assert_eq!(tracker.total_tokens(), 195);
        let mut models: Vec<_> = tracker.models().collect();
        models.sort_by_key(|(name, _)| *name);
        assert_eq!(
            models,
            vec![
                ("gemini-1.5-flash", &usage(10, 5, 0)),
                ("gemini-1.5-flash-001", &usage(150, 30, 120)),
            ]
        );
    }

    #[test]
    fn cache_hit_ratio() {
        let mut tracker = TokenTracker::new();
        assert_eq!(tracker.cache_hit_ratio(), 0.0);
        tracker.record("m", &usage(200, 0, 150));
        assert!((tracker.cache_hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
