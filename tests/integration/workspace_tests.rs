/*!
 * Workspace artifact tests: drafts, verdicts, and reports on disk.
 */

use pagesmith::app_config::{PolicyConfig, ReviewConfig};
use pagesmith::drafter::{DraftService, Drafter};
use pagesmith::file_utils::Workspace;
use pagesmith::pipeline::{Pipeline, PipelineConfig};
use pagesmith::providers::mock::MockProvider;
use pagesmith::validator::{Validator, Verdict};

use crate::common;

#[tokio::test]
async fn test_pipelineArtifacts_shouldRoundTripThroughWorkspace() {
    let dir = tempfile::TempDir::new().unwrap();
    let workspace = Workspace::new(dir.path());
    workspace.ensure_layout().unwrap();

    let pipeline = Pipeline::new(
        Drafter::new(DraftService::with_mock(MockProvider::working())),
        Validator::new(ReviewConfig::default()),
        PipelineConfig::default(),
    );

    let outcome = pipeline
        .run(
            &common::active_context("meld"),
            &PolicyConfig::default(),
            &common::published_page(),
        )
        .await
        .unwrap();

    // Save the artifacts the way the controller does
    workspace
        .write_text(&workspace.draft_path("meld"), outcome.candidate.html())
        .unwrap();
    workspace
        .write_json(&workspace.verdict_path("meld"), &outcome.verdict)
        .unwrap();

    // Draft round-trips byte for byte
    let saved_draft = workspace.read_text(&workspace.draft_path("meld")).unwrap();
    assert_eq!(saved_draft, outcome.candidate.html());

    // Verdict round-trips structurally
    let saved_verdict: Option<Verdict> =
        workspace.read_json(&workspace.verdict_path("meld")).unwrap();
    let saved_verdict = saved_verdict.unwrap();
    assert_eq!(saved_verdict.status, outcome.verdict.status);
    assert_eq!(saved_verdict.issues, outcome.verdict.issues);

    // Draft listing sees the slug
    assert_eq!(workspace.list_draft_slugs().unwrap(), vec!["meld"]);
}

#[test]
fn test_contextJson_shouldRoundTripThroughWorkspace() {
    use pagesmith::collector::models::{CollectionContext, CollectionSummary};

    let dir = tempfile::TempDir::new().unwrap();
    let workspace = Workspace::new(dir.path());

    let context = CollectionContext {
        generated_at: "2025-06-01T00:00:00Z".to_string(),
        config_hash: "deadbeef".to_string(),
        projects: vec![common::active_context("meld")],
        summary: CollectionSummary {
            total: 1,
            updates: 1,
            ..Default::default()
        },
    };

    workspace
        .write_json(&workspace.context_path(), &context)
        .unwrap();

    let loaded: Option<CollectionContext> =
        workspace.read_json(&workspace.context_path()).unwrap();
    let loaded = loaded.unwrap();

    assert_eq!(loaded.config_hash, "deadbeef");
    assert_eq!(loaded.projects.len(), 1);
    assert_eq!(loaded.projects[0].slug, "meld");
    assert!(loaded.summary.has_updates());
}
