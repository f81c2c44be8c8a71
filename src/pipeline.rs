/*!
 * The draft-then-review pipeline.
 *
 * Strictly one-directional: the drafter's candidate is the sole artifact
 * handed to the validator, together with the very same context, policy,
 * and published page that produced it. Neither stage calls back into the
 * other, and nothing is shared across runs.
 *
 * Each stage is bounded by a caller-supplied deadline; expiry surfaces a
 * timeout failure, never a partial result. Retries are the caller's
 * business and always cover a whole draft-then-review attempt.
 */

use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::time::timeout;

use crate::app_config::{GenerationCommonConfig, PolicyConfig};
use crate::collector::models::ProjectContext;
use crate::drafter::Drafter;
use crate::errors::PipelineError;
use crate::page::PageDocument;
use crate::validator::{Validator, Verdict};

/// Deadlines for the two pipeline stages
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Deadline for the draft stage
    pub draft_timeout: Duration,
    /// Deadline for the review stage
    pub review_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            draft_timeout: Duration::from_secs(180),
            review_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&GenerationCommonConfig> for PipelineConfig {
    fn from(common: &GenerationCommonConfig) -> Self {
        Self {
            draft_timeout: Duration::from_secs(common.draft_timeout_secs),
            review_timeout: Duration::from_secs(common.review_timeout_secs),
        }
    }
}

/// Result of one complete pipeline run
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The drafted candidate page
    pub candidate: PageDocument,
    /// The validator's verdict on that candidate
    pub verdict: Verdict,
    /// Wall time spent drafting
    pub draft_elapsed: Duration,
    /// Wall time spent reviewing
    pub review_elapsed: Duration,
}

/// Two-stage generate-then-validate pipeline for one project
pub struct Pipeline {
    drafter: Drafter,
    validator: Validator,
    config: PipelineConfig,
}

impl Pipeline {
    /// Assemble a pipeline from its stages
    pub fn new(drafter: Drafter, validator: Validator, config: PipelineConfig) -> Self {
        Self {
            drafter,
            validator,
            config,
        }
    }

    /// Access the drafter (for usage totals)
    pub fn drafter(&self) -> &Drafter {
        &self.drafter
    }

    /// Run draft-then-review for one project.
    ///
    /// The candidate is always validated against the same inputs that
    /// produced it. Stateless across calls.
    pub async fn run(
        &self,
        context: &ProjectContext,
        policy: &PolicyConfig,
        published: &PageDocument,
    ) -> Result<PipelineOutcome, PipelineError> {
        let draft_started = Instant::now();
        let candidate = timeout(
            self.config.draft_timeout,
            self.drafter.draft(context, policy, published),
        )
        .await
        .map_err(|_| PipelineError::Timeout {
            stage: "draft",
            timeout_secs: self.config.draft_timeout.as_secs(),
        })??;
        let draft_elapsed = draft_started.elapsed();

        debug!(
            "Draft stage for {} finished in {:?}",
            context.slug, draft_elapsed
        );

        // The review is CPU-bound and pure; run it off the async runtime
        // so the deadline can actually fire on a pathological input.
        let review_started = Instant::now();
        let validator = self.validator.clone();
        let review_context = context.clone();
        let review_policy = policy.clone();
        let review_published = published.clone();
        let review_candidate = candidate.clone();

        let verdict = timeout(
            self.config.review_timeout,
            tokio::task::spawn_blocking(move || {
                validator.review(
                    &review_context,
                    &review_policy,
                    &review_published,
                    &review_candidate,
                )
            }),
        )
        .await
        .map_err(|_| PipelineError::Timeout {
            stage: "review",
            timeout_secs: self.config.review_timeout.as_secs(),
        })?
        .map_err(|e| PipelineError::Internal(format!("review task panicked: {}", e)))??;
        let review_elapsed = review_started.elapsed();

        info!(
            "Pipeline for {}: {:?} ({} issues, {}% changed)",
            context.slug,
            verdict.status,
            verdict.issues.len(),
            verdict.change_percentage
        );

        Ok(PipelineOutcome {
            candidate,
            verdict,
            draft_elapsed,
            review_elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::ReviewConfig;
    use crate::collector::models::{CommitInfo, CommitType, PageState, ProjectStatus};
    use crate::drafter::DraftService;
    use crate::providers::mock::MockProvider;
    use crate::validator::VerdictStatus;

    fn active_context() -> ProjectContext {
        ProjectContext {
            slug: "meld".to_string(),
            repo: "octo/meld".to_string(),
            status: ProjectStatus::Update,
            change_score: 60,
            change_reason: "feature_commit".to_string(),
            description: "A factual summary of the tool".to_string(),
            stars: 5,
            forks: 1,
            commits: vec![CommitInfo {
                sha: "abc1234".to_string(),
                date: "2025-06-01".to_string(),
                message: "feat: add things".to_string(),
                commit_type: CommitType::Feat,
                author: "dev".to_string(),
            }],
            releases: Vec::new(),
            languages: vec!["Rust".to_string()],
            readme_excerpt: String::new(),
            page: PageState::default(),
        }
    }

    fn published_plain() -> PageDocument {
        PageDocument::new(
            r#"<html><body>
<section id="summary">Old summary.</section>
<section id="changelog">Old changelog.</section>
<section id="status-badge">Old status.</section>
</body></html>"#,
        )
    }

    fn pipeline_with(mock: MockProvider, config: PipelineConfig) -> Pipeline {
        Pipeline::new(
            Drafter::new(DraftService::with_mock(mock)),
            Validator::new(ReviewConfig::default()),
            config,
        )
    }

    #[tokio::test]
    async fn test_run_withWorkingProvider_shouldApproveCleanCandidate() {
        let pipeline = pipeline_with(MockProvider::working(), PipelineConfig::default());

        let outcome = pipeline
            .run(&active_context(), &PolicyConfig::default(), &published_plain())
            .await
            .unwrap();

        assert_eq!(outcome.verdict.status, VerdictStatus::Approve);
        assert!(outcome.candidate.deploy_date().is_some());
    }

    #[tokio::test]
    async fn test_run_withPromotionalDraft_shouldReject() {
        let pipeline = pipeline_with(MockProvider::promotional(), PipelineConfig::default());

        let outcome = pipeline
            .run(&active_context(), &PolicyConfig::default(), &published_plain())
            .await
            .unwrap();

        assert_eq!(outcome.verdict.status, VerdictStatus::Reject);
        assert!(outcome
            .verdict
            .issues
            .iter()
            .any(|i| i.contains("revolutionary")));
    }

    #[tokio::test]
    async fn test_run_withSlowProvider_shouldTimeOutOnDraftStage() {
        let config = PipelineConfig {
            draft_timeout: Duration::from_millis(50),
            review_timeout: Duration::from_secs(5),
        };
        let pipeline = pipeline_with(MockProvider::slow(5_000), config);

        let err = pipeline
            .run(&active_context(), &PolicyConfig::default(), &published_plain())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Timeout { stage: "draft", .. }
        ));
    }

    #[test]
    fn test_run_withFailingProvider_shouldAbortBeforeReview() {
        let pipeline = pipeline_with(MockProvider::failing(), PipelineConfig::default());

        let err = tokio_test::block_on(pipeline.run(
            &active_context(),
            &PolicyConfig::default(),
            &published_plain(),
        ))
        .unwrap_err();

        assert!(matches!(err, PipelineError::Provider(_)));
    }

    #[tokio::test]
    async fn test_run_withMalformedPublishedPage_shouldSurfaceStructuralError() {
        let malformed = PageDocument::new("<html><body><!-- MANUAL:a -->x</body></html>");
        let pipeline = pipeline_with(MockProvider::working(), PipelineConfig::default());

        let err = pipeline
            .run(&active_context(), &PolicyConfig::default(), &malformed)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Structural(_)));
    }
}
