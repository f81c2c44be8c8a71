/*!
 * Observer: run aggregation, cost accounting, and reporting.
 *
 * Collects what every phase produced into one run record, prices the
 * token usage, renders a human-readable summary report, and persists the
 * run into the history store.
 *
 * # Architecture
 *
 * - `store`: SQLite-backed run history
 */

pub mod store;

use serde::{Deserialize, Serialize};

use crate::collector::models::CollectionSummary;
use crate::drafter::TokenUsage;

// Re-export main types
pub use store::RunStore;

/// Input token price per 1K tokens (USD)
const PRICE_INPUT_PER_1K: f64 = 0.003;

/// Output token price per 1K tokens (USD)
const PRICE_OUTPUT_PER_1K: f64 = 0.015;

/// Priced token usage for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Input tokens consumed
    pub input_tokens: u64,
    /// Output tokens generated
    pub output_tokens: u64,
    /// Cost of input tokens (USD)
    pub input_cost: f64,
    /// Cost of output tokens (USD)
    pub output_cost: f64,
    /// Total cost (USD)
    pub total: f64,
}

impl CostBreakdown {
    /// Price a usage record
    pub fn from_usage(usage: &TokenUsage) -> Self {
        let input_cost = usage.input_tokens as f64 / 1000.0 * PRICE_INPUT_PER_1K;
        let output_cost = usage.output_tokens as f64 / 1000.0 * PRICE_OUTPUT_PER_1K;

        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            input_cost,
            output_cost,
            total: input_cost + output_cost,
        }
    }

    /// Dollar-formatted total
    pub fn total_formatted(&self) -> String {
        format!("${:.4}", self.total)
    }
}

/// Per-slug outcome carried into the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectOutcome {
    /// Page slug
    pub slug: String,
    /// Final disposition ("pushed", "pr", "skipped", "rejected", "error")
    pub disposition: String,
    /// Detail: PR URL, skip reason, or error text
    pub detail: String,
}

/// Review decision counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReviewCounts {
    pub approved: usize,
    pub flagged: usize,
    pub rejected: usize,
}

/// Deployment counters
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeployCounts {
    pub pushed: usize,
    pub prs_created: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// One full run, aggregated across all phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: String,
    /// RFC 3339 start timestamp
    pub timestamp: String,
    /// Whether the run mutated anything
    pub dry_run: bool,
    /// Collector summary
    pub collected: CollectionSummary,
    /// Drafts generated
    pub drafted: usize,
    /// Draft attempts that failed
    pub draft_errors: usize,
    /// Review decision counters
    pub reviews: ReviewCounts,
    /// Deployment counters
    pub deploys: DeployCounts,
    /// Per-project outcomes
    pub outcomes: Vec<ProjectOutcome>,
    /// Token usage totals
    pub usage: TokenUsage,
    /// Priced usage
    pub cost: CostBreakdown,
}

impl RunReport {
    /// Start an empty report for a run
    pub fn new(run_id: String, timestamp: String, dry_run: bool) -> Self {
        Self {
            run_id,
            timestamp,
            dry_run,
            collected: CollectionSummary::default(),
            drafted: 0,
            draft_errors: 0,
            reviews: ReviewCounts::default(),
            deploys: DeployCounts::default(),
            outcomes: Vec::new(),
            usage: TokenUsage::default(),
            cost: CostBreakdown::default(),
        }
    }

    /// Price the accumulated usage
    pub fn finalize(&mut self) {
        self.cost = CostBreakdown::from_usage(&self.usage);
    }

    /// A run succeeds when something was deployed and nothing errored
    pub fn success(&self) -> bool {
        (self.deploys.pushed + self.deploys.prs_created) > 0
            && self.deploys.errors == 0
            && self.draft_errors == 0
    }

    /// Render the human-readable markdown summary
    pub fn render_markdown(&self) -> String {
        let mut report = format!(
            "# Pagesmith Run Summary\n\n\
             **Run ID**: {}\n\
             **Timestamp**: {}\n\
             **Status**: {}\n\
             **Dry run**: {}\n\n\
             ## Phase summary\n\n\
             | Phase | Details |\n\
             |-------|---------|\n\
             | Collector | {} projects, {} updates, {} new, {} skipped, {} locked |\n\
             | Drafter | {} drafts, {} errors |\n\
             | Reviewer | {} approved, {} flagged, {} rejected |\n\
             | Deployer | {} pushed, {} PRs, {} skipped |\n\n\
             ## Cost\n\n\
             | Metric | Value |\n\
             |--------|-------|\n\
             | Input tokens | {} |\n\
             | Output tokens | {} |\n\
             | **Total cost** | **{}** |\n\n",
            self.run_id,
            self.timestamp,
            if self.success() { "Success" } else { "Partial/Failed" },
            if self.dry_run { "Yes" } else { "No" },
            self.collected.total,
            self.collected.updates,
            self.collected.new,
            self.collected.skips,
            self.collected.locked,
            self.drafted,
            self.draft_errors,
            self.reviews.approved,
            self.reviews.flagged,
            self.reviews.rejected,
            self.deploys.pushed,
            self.deploys.prs_created,
            self.deploys.skipped,
            self.usage.input_tokens,
            self.usage.output_tokens,
            self.cost.total_formatted(),
        );

        if !self.outcomes.is_empty() {
            report.push_str("## Projects\n\n");
            for outcome in &self.outcomes {
                if outcome.detail.is_empty() {
                    report.push_str(&format!("- {}: {}\n", outcome.slug, outcome.disposition));
                } else {
                    report.push_str(&format!(
                        "- {}: {} ({})\n",
                        outcome.slug, outcome.disposition, outcome.detail
                    ));
                }
            }
            report.push('\n');
        }

        report.push_str("---\n*Generated by pagesmith*\n");
        report
    }

    /// Build a run id from a timestamp and a random suffix
    pub fn make_run_id(now: &chrono::DateTime<chrono::Utc>) -> String {
        let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        format!("{}-{}", now.format("%Y%m%d-%H%M%S"), suffix)
    }
}
