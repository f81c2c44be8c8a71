/*!
 * Review service that orchestrates all candidate checks.
 *
 * The validator is a pure function of (context, policy, published,
 * candidate): no provider calls, no I/O, no clock. Policy violations are
 * data - they resolve into a verdict, never an error. Only a structurally
 * malformed *published* page aborts, since the contract requires a valid
 * input pair.
 *
 * Decision policy: any fatal finding rejects; otherwise any soft finding
 * flags; otherwise approve. Ties resolve toward rejection (fail closed).
 */

use log::debug;
use serde::{Deserialize, Serialize};

use crate::app_config::{PolicyConfig, ReviewConfig};
use crate::collector::models::ProjectContext;
use crate::errors::PipelineError;
use crate::page::PageDocument;

use super::diff::line_diff;
use super::structure::check_structure;
use super::tone::{find_forbidden_words, find_promotional_words};
use super::traceability::{untraceable_claims, visible_text, Evidence};

/// Review decision for a candidate page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    /// Candidate may be deployed
    Approve,
    /// Candidate needs human review
    Flagged,
    /// Candidate must not be deployed
    Reject,
}

/// The structured output of validation.
///
/// Serialized as JSON to `reviews/<slug>_verdict.json` and attached to
/// pull requests by the deployer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Review decision
    pub status: VerdictStatus,
    /// One-sentence explanation of the decision
    pub reason: String,
    /// Ordered findings, most severe first
    pub issues: Vec<String>,
    /// Human-readable diff summary
    pub diff_summary: String,
    /// Share of the document that differs from the published version, 0-100
    pub change_percentage: u8,
}

impl Verdict {
    /// Whether the candidate may be deployed at all
    pub fn is_deployable(&self) -> bool {
        matches!(self.status, VerdictStatus::Approve | VerdictStatus::Flagged)
    }
}

/// Review service for candidate pages
#[derive(Debug, Clone, Default)]
pub struct Validator {
    review: ReviewConfig,
}

impl Validator {
    /// Create a validator with the given review thresholds
    pub fn new(review: ReviewConfig) -> Self {
        Self { review }
    }

    /// Review a candidate against the published page and the source of
    /// truth.
    ///
    /// Pure and deterministic: the same input tuple always yields the
    /// same verdict.
    pub fn review(
        &self,
        context: &ProjectContext,
        policy: &PolicyConfig,
        published: &PageDocument,
        candidate: &PageDocument,
    ) -> Result<Verdict, PipelineError> {
        // A malformed published page is a precondition failure, not a
        // candidate defect
        let published_regions = published.manual_regions()?;

        let mut fatal: Vec<String> = Vec::new();
        let mut soft: Vec<String> = Vec::new();

        // Check 2: structure (well-formedness, manual regions, sections)
        for issue in check_structure(candidate, &published_regions, &policy.required_sections) {
            if issue.is_fatal() {
                fatal.push(issue.description());
            } else {
                soft.push(issue.description());
            }
        }

        // Check 3: tone (forbidden words are fatal, promotion is soft)
        let forbidden = find_forbidden_words(candidate.html(), &policy.forbidden_words);
        if !forbidden.is_empty() {
            fatal.push(format!("Forbidden words found: {}", forbidden.join(", ")));
        }

        let candidate_text = visible_text(candidate.html());
        for word in find_promotional_words(&candidate_text) {
            soft.push(format!("Promotional language: {}", word));
        }

        // Check 4: policy (summary length, re-measured here regardless of
        // what the drafter claims)
        match candidate.section_text("summary") {
            Some(summary) => {
                let length = summary.chars().count();
                let bound = policy.max_summary_length;

                if length > bound {
                    soft.push(format!(
                        "Summary exceeds maximum length: {} > {} characters",
                        length, bound
                    ));
                } else {
                    let margin = bound * self.review.summary_boundary_margin as usize / 100;
                    if length + margin >= bound {
                        soft.push(format!(
                            "Summary length {} is suspiciously close to the {} bound",
                            length, bound
                        ));
                    }
                }
            }
            None => {
                // Covered by the missing-section finding when summary is a
                // required section; nothing further to measure
            }
        }

        // Check 1: traceability of factual claims
        let published_html = published.html();
        let evidence = Evidence::assemble(context, published_html);
        for claim in untraceable_claims(&candidate_text, &evidence) {
            soft.push(claim.description());
        }

        // Check 5: diff proportionality
        let diff = line_diff(published_html, candidate.html());
        if context.is_quiet() && diff.change_percentage > self.review.quiet_change_threshold {
            soft.push(format!(
                "Change of {}% with no new commits or releases",
                diff.change_percentage
            ));
        }

        let verdict = Self::decide(fatal, soft, &diff);
        debug!(
            "Review of {}: {:?} ({} issues, {}% changed)",
            context.slug,
            verdict.status,
            verdict.issues.len(),
            verdict.change_percentage
        );

        Ok(verdict)
    }

    /// Fold findings into a verdict, fatal findings first
    fn decide(
        fatal: Vec<String>,
        soft: Vec<String>,
        diff: &super::diff::DiffResult,
    ) -> Verdict {
        let diff_summary = diff.summary();
        let change_percentage = diff.change_percentage;

        if let Some(first) = fatal.first() {
            let reason = first.clone();
            let mut issues = fatal;
            issues.extend(soft);
            return Verdict {
                status: VerdictStatus::Reject,
                reason,
                issues,
                diff_summary,
                change_percentage,
            };
        }

        if let Some(first) = soft.first() {
            return Verdict {
                status: VerdictStatus::Flagged,
                reason: first.clone(),
                issues: soft,
                diff_summary,
                change_percentage,
            };
        }

        Verdict {
            status: VerdictStatus::Approve,
            reason: "All checks passed".to_string(),
            issues: Vec::new(),
            diff_summary,
            change_percentage,
        }
    }
}
