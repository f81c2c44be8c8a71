/*!
 * Significance scoring tests against the configured weights.
 */

use pagesmith::app_config::ScoringConfig;
use pagesmith::collector::models::ProjectStatus;
use pagesmith::collector::significance::Significance;

use crate::common;

#[test]
fn test_calculate_withActiveProject_shouldUpdate() {
    let context = common::active_context("meld");

    let result = Significance::calculate(
        &ScoringConfig::default(),
        &context.commits,
        !context.releases.is_empty(),
        true,
        false,
    );

    // release (100) + readme (40) + feat (30)
    assert_eq!(result.change_score, 170);
    assert_eq!(result.status, ProjectStatus::Update);
    assert_eq!(result.change_reason, "release_tag");
}

#[test]
fn test_calculate_withQuietProject_shouldSkipWithNoActivity() {
    let context = common::quiet_context("meld");

    let result = Significance::calculate(
        &ScoringConfig::default(),
        &context.commits,
        false,
        false,
        false,
    );

    assert_eq!(result.status, ProjectStatus::Skip);
    assert_eq!(result.change_reason, "no_activity");
}

#[test]
fn test_calculate_newProjectBeatsEverything() {
    // Even a completely quiet new project updates
    let result = Significance::calculate(&ScoringConfig::default(), &[], false, false, true);

    assert_eq!(result.status, ProjectStatus::New);
    assert_eq!(result.change_score, 999);
}

#[test]
fn test_calculate_thresholdBoundary_shouldBeInclusive() {
    use pagesmith::collector::models::{CommitInfo, CommitType};

    let scoring = ScoringConfig {
        update_threshold: 40,
        ..Default::default()
    };
    // A docs commit scores zero but keeps the project out of the
    // no-activity short circuit, so the README weight lands alone
    let commits = vec![CommitInfo {
        sha: "abc1234".to_string(),
        date: "2025-06-01".to_string(),
        message: "docs: fix typo".to_string(),
        commit_type: CommitType::Docs,
        author: "dev".to_string(),
    }];

    let result = Significance::calculate(&scoring, &commits, false, true, false);

    assert_eq!(result.change_score, 40);
    assert_eq!(result.status, ProjectStatus::Update);
}
