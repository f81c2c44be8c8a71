/*!
 * Drafter: generates candidate page documents from collected context.
 *
 * The drafter is the only stage that talks to an LLM provider. Its
 * contract: given (ProjectContext, PolicyConfig, published PageDocument),
 * produce a complete candidate PageDocument or fail outright - partial
 * documents are never returned.
 *
 * Manual regions from the published page are re-injected verbatim after
 * generation, so the model cannot alter protected content even when it
 * tries.
 *
 * # Architecture
 *
 * - `prompts`: Writer prompt template and builder
 * - `engine`: Provider dispatch and the draft pipeline stage
 */

pub mod engine;
pub mod prompts;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// Re-export main types
pub use engine::{DraftService, Drafter};
pub use prompts::DraftPromptBuilder;

/// Token usage totals for provider calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed
    pub input_tokens: u64,
    /// Output tokens generated
    pub output_tokens: u64,
    /// Number of requests made
    pub requests: u64,
}

impl TokenUsage {
    /// Sum two usage records
    pub fn add(&self, other: &TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            requests: self.requests + other.requests,
        }
    }
}

/// Thread-safe accumulator for token usage across concurrent drafts
#[derive(Debug, Default)]
pub struct UsageTracker {
    totals: Mutex<TokenUsage>,
}

impl UsageTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one provider request
    pub fn record(&self, input_tokens: u64, output_tokens: u64) {
        let mut totals = self.totals.lock();
        totals.input_tokens += input_tokens;
        totals.output_tokens += output_tokens;
        totals.requests += 1;
    }

    /// Snapshot the current totals
    pub fn snapshot(&self) -> TokenUsage {
        *self.totals.lock()
    }
}
