/*!
 * End-to-end tests for the draft-then-review pipeline with mock
 * providers.
 */

use std::time::Duration;

use pagesmith::app_config::{PolicyConfig, ReviewConfig};
use pagesmith::drafter::{DraftService, Drafter};
use pagesmith::errors::PipelineError;
use pagesmith::page::PageDocument;
use pagesmith::pipeline::{Pipeline, PipelineConfig};
use pagesmith::providers::mock::MockProvider;
use pagesmith::validator::{Validator, VerdictStatus};

use crate::common;

fn pipeline(mock: MockProvider) -> Pipeline {
    Pipeline::new(
        Drafter::new(DraftService::with_mock(mock)),
        Validator::new(ReviewConfig::default()),
        PipelineConfig::default(),
    )
}

/// A mock that faithfully updates the standard published page
fn faithful_mock() -> MockProvider {
    MockProvider::working().with_custom_response(|_req| {
        common::PUBLISHED_PAGE
            .replace(
                "Deterministic filesystem state management in Rust.",
                "Deterministic filesystem state management in Rust, v1.1.0.",
            )
            .to_string()
    })
}

#[tokio::test]
async fn test_pipeline_faithfulDraft_shouldApproveAndPreserveRegions() {
    common::init_test_logging();

    let outcome = pipeline(faithful_mock())
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.verdict.status, VerdictStatus::Approve);

    let regions = outcome.candidate.manual_regions().unwrap();
    assert_eq!(regions, common::published_page().manual_regions().unwrap());
    assert!(outcome.candidate.deploy_date().is_some());
}

#[tokio::test]
async fn test_pipeline_hallucinatingDraft_shouldNotApprove() {
    let mock = MockProvider::working().with_custom_response(|_req| {
        common::PUBLISHED_PAGE
            .replace(
                "Deterministic filesystem state management in Rust.",
                "Rewritten in Haskell with GPU acceleration since v7.0.",
            )
            .to_string()
    });

    let outcome = pipeline(mock)
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap();

    assert_ne!(outcome.verdict.status, VerdictStatus::Approve);
    assert!(!outcome.verdict.issues.is_empty());
}

#[tokio::test]
async fn test_pipeline_promotionalDraft_shouldReject() {
    let outcome = pipeline(MockProvider::promotional())
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &PageDocument::new("<html><body><section id=\"summary\">s</section></body></html>"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.verdict.status, VerdictStatus::Reject);
}

#[tokio::test]
async fn test_pipeline_regionTamperingDraft_shouldBeNeutralizedByReinjection() {
    // The model tries to rewrite the protected notes; re-injection
    // restores them, so the verdict does not even see the tampering
    let mock = MockProvider::working().with_custom_response(|_req| {
        common::PUBLISHED_PAGE
            .replace(
                "These notes were written by hand.",
                "The model replaced the notes.",
            )
            .to_string()
    });

    let outcome = pipeline(mock)
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap();

    assert!(outcome
        .candidate
        .html()
        .contains("These notes were written by hand."));
    assert_eq!(outcome.verdict.status, VerdictStatus::Approve);
}

#[tokio::test]
async fn test_pipeline_draftTimeout_shouldSurfaceTimeoutError() {
    let slow = Pipeline::new(
        Drafter::new(DraftService::with_mock(MockProvider::slow(10_000))),
        Validator::new(ReviewConfig::default()),
        PipelineConfig {
            draft_timeout: Duration::from_millis(50),
            review_timeout: Duration::from_secs(5),
        },
    );

    let err = slow
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Timeout { stage: "draft", .. }));
}

#[tokio::test]
async fn test_pipeline_emptyDraft_shouldFailWithoutVerdict() {
    let err = pipeline(MockProvider::empty())
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyDraft));
}

#[tokio::test]
async fn test_pipeline_usageAccumulates_acrossRuns() {
    let p = pipeline(faithful_mock());

    for _ in 0..3 {
        p.run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap();
    }

    assert_eq!(p.drafter().service().usage().requests, 3);
}
