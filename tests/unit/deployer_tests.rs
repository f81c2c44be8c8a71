/*!
 * Deploy gating tests: the decision table between verdicts and the site.
 */

use pagesmith::app_config::{WorkflowConfig, WorkflowMode};
use pagesmith::collector::github::GitHubClient;
use pagesmith::collector::models::PageState;
use pagesmith::deployer::{DeployAction, Deployer};
use pagesmith::page::PageDocument;
use pagesmith::validator::{Verdict, VerdictStatus};

use crate::common;

fn verdict(status: VerdictStatus, change_percentage: u8) -> Verdict {
    Verdict {
        status,
        reason: "test reason".to_string(),
        issues: Vec::new(),
        diff_summary: "diff".to_string(),
        change_percentage,
    }
}

fn deployer(mode: WorkflowMode, high_risk_threshold: u8) -> Deployer {
    Deployer::new(
        GitHubClient::new_with_api_url(Some("token".to_string()), "http://localhost:1"),
        "octocat/bio-site",
        "main",
        "projects/",
        WorkflowConfig {
            mode,
            force_pr_on_high_risk: true,
            high_risk_threshold,
        },
    )
    .with_dry_run(true)
}

#[test]
fn test_decisionTable_autoMode() {
    let deployer = deployer(WorkflowMode::Auto, 30);

    // Approve + low risk -> push
    assert!(!deployer.should_create_pr(&verdict(VerdictStatus::Approve, 10), false));
    // Approve + high risk -> PR
    assert!(deployer.should_create_pr(&verdict(VerdictStatus::Approve, 31), false));
    // Flagged -> PR always
    assert!(deployer.should_create_pr(&verdict(VerdictStatus::Flagged, 1), false));
    // Stale -> PR regardless of everything else
    assert!(deployer.should_create_pr(&verdict(VerdictStatus::Approve, 1), true));
}

#[test]
fn test_decisionTable_manualMode_shouldAlwaysPr() {
    let deployer = deployer(WorkflowMode::Manual, 30);

    assert!(deployer.should_create_pr(&verdict(VerdictStatus::Approve, 0), false));
    assert!(deployer.should_create_pr(&verdict(VerdictStatus::Flagged, 0), false));
}

#[test]
fn test_highRiskThreshold_shouldBeExclusive() {
    let deployer = deployer(WorkflowMode::Auto, 30);

    // Exactly at the threshold is still a direct push
    assert!(!deployer.should_create_pr(&verdict(VerdictStatus::Approve, 30), false));
    assert!(deployer.should_create_pr(&verdict(VerdictStatus::Approve, 31), false));
}

#[test]
fn test_isStale_shouldCompareCollectedAgainstCurrent() {
    let collected = common::PUBLISHED_PAGE.to_string();
    let state = PageState {
        exists: true,
        content: Some(collected.clone()),
        ..Default::default()
    };

    assert!(!Deployer::is_stale(&state, Some(&collected)));
    assert!(Deployer::is_stale(
        &state,
        Some("<html><body>someone edited this</body></html>")
    ));
    assert!(Deployer::is_stale(&state, None));
}

#[tokio::test]
async fn test_deploy_rejectedCandidate_shouldNeverReachTheSite() {
    let deployer = deployer(WorkflowMode::Auto, 30);
    let candidate = PageDocument::new(common::PUBLISHED_PAGE);

    let action = deployer
        .deploy(
            "meld",
            &candidate,
            &verdict(VerdictStatus::Reject, 5),
            &PageState::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        action,
        DeployAction::Skipped {
            reason: "test reason".to_string()
        }
    );
}

#[test]
fn test_prBody_shouldListIssues() {
    let mut v = verdict(VerdictStatus::Flagged, 18);
    v.issues = vec![
        "Summary length 595 is suspiciously close to the 600 bound".to_string(),
        "Promotional language: amazing".to_string(),
    ];

    let body = Deployer::build_pr_body("meld", &v);

    assert!(body.contains("### Issues noted"));
    assert!(body.contains("suspiciously close"));
    assert!(body.contains("Promotional language"));
}
