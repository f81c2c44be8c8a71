/*!
 * Review tests covering the verdict contract end to end.
 */

use pagesmith::app_config::{PolicyConfig, ReviewConfig};
use pagesmith::page::PageDocument;
use pagesmith::validator::{Validator, VerdictStatus};

use crate::common;

fn validator() -> Validator {
    Validator::new(ReviewConfig::default())
}

fn policy() -> PolicyConfig {
    PolicyConfig::default()
}

#[test]
fn test_review_withFaithfulUpdate_shouldApprove() {
    let candidate = PageDocument::new(common::PUBLISHED_PAGE.replace(
        "feat: add frame sets",
        "feat: add frame sets (2025-06-01)",
    ));

    let verdict = validator()
        .review(
            &common::active_context("meld"),
            &policy(),
            &common::published_page(),
            &candidate,
        )
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Approve);
    assert!(verdict.issues.is_empty());
    assert!(verdict.change_percentage < 20);
}

#[test]
fn test_review_forbiddenWordScenario_shouldRejectCitingWord() {
    // Scenario: candidate contains "revolutionary" and the policy forbids it
    let candidate = PageDocument::new(common::PUBLISHED_PAGE.replace(
        "Deterministic filesystem state management in Rust.",
        "A revolutionary approach to filesystem state in Rust.",
    ));

    let verdict = validator()
        .review(
            &common::active_context("meld"),
            &policy(),
            &common::published_page(),
            &candidate,
        )
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Reject);
    assert!(verdict.issues.iter().any(|i| i.contains("revolutionary")));
}

#[test]
fn test_review_droppedManualRegionScenario_shouldRejectCitingRemoval() {
    // Scenario: candidate drops the manual region entirely
    let without_region = common::PUBLISHED_PAGE
        .lines()
        .filter(|line| !line.contains("MANUAL") && !line.contains("written by hand"))
        .collect::<Vec<_>>()
        .join("\n");
    let candidate = PageDocument::new(without_region);

    let verdict = validator()
        .review(
            &common::active_context("meld"),
            &policy(),
            &common::published_page(),
            &candidate,
        )
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Reject);
    assert!(verdict
        .issues
        .iter()
        .any(|i| i.contains("Manual region 'notes' was removed")));
}

#[test]
fn test_review_overlongSummary_shouldNeverApprove() {
    let candidate = PageDocument::new(common::PUBLISHED_PAGE.replace(
        "Deterministic filesystem state management in Rust.",
        &"word ".repeat(200),
    ));

    let verdict = validator()
        .review(
            &common::active_context("meld"),
            &policy(),
            &common::published_page(),
            &candidate,
        )
        .unwrap();

    assert_ne!(verdict.status, VerdictStatus::Approve);
}

#[test]
fn test_review_untraceableFeatureClaim_shouldNotApprove() {
    let candidate = PageDocument::new(common::PUBLISHED_PAGE.replace(
        "Deterministic filesystem state management in Rust.",
        "Deterministic state management, now rewritten in Zig as v4.0.0.",
    ));

    let verdict = validator()
        .review(
            &common::active_context("meld"),
            &policy(),
            &common::published_page(),
            &candidate,
        )
        .unwrap();

    assert_ne!(verdict.status, VerdictStatus::Approve);
    assert!(!verdict.issues.is_empty());
    assert!(verdict.issues.iter().any(|i| i.contains("Zig")));
    assert!(verdict.issues.iter().any(|i| i.contains("v4.0.0")));
}

#[test]
fn test_review_quietProjectScenario_shouldApproveWithNearZeroChange() {
    // Scenario: no commits, no releases; candidate only renders the
    // explicit no-release / no-updates state
    let candidate = PageDocument::new(
        common::PUBLISHED_PAGE
            .replace("v1.1.0</section>", "No releases yet.</section>")
            .replace(
                "<ul><li>feat: add frame sets</li></ul>",
                "<ul><li>No recent updates.</li></ul>",
            ),
    );

    let verdict = validator()
        .review(
            &common::quiet_context("meld"),
            &policy(),
            &common::published_page(),
            &candidate,
        )
        .unwrap();

    assert_eq!(verdict.status, VerdictStatus::Approve);
    assert!(verdict.change_percentage <= 15);
}

#[test]
fn test_review_sameTupleTwice_shouldYieldIdenticalVerdicts() {
    let context = common::active_context("meld");
    let published = common::published_page();
    let candidate = PageDocument::new(common::PUBLISHED_PAGE.replace("v1.1.0", "v1.1.0 (stable)"));
    let policy = policy();

    let first = validator()
        .review(&context, &policy, &published, &candidate)
        .unwrap();
    let second = validator()
        .review(&context, &policy, &published, &candidate)
        .unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.reason, second.reason);
    assert_eq!(first.issues, second.issues);
    assert_eq!(first.diff_summary, second.diff_summary);
    assert_eq!(first.change_percentage, second.change_percentage);
}

#[test]
fn test_review_verdictJson_shouldCarryContractFields() {
    let verdict = validator()
        .review(
            &common::active_context("meld"),
            &policy(),
            &common::published_page(),
            &common::published_page(),
        )
        .unwrap();

    let json = serde_json::to_value(&verdict).unwrap();

    for field in ["status", "reason", "issues", "diff_summary", "change_percentage"] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }
    assert!(json["change_percentage"].is_u64());
}
