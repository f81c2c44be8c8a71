/*!
 * Common test utilities for the pagesmith test suite
 */

use pagesmith::collector::models::{
    CommitInfo, CommitType, PageState, ProjectContext, ProjectStatus, ReleaseInfo,
};
use pagesmith::page::PageDocument;

/// Initialize logging for tests that want to inspect output
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A published page with the standard sections and one manual region
pub const PUBLISHED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body>
<main>
<h1>meld</h1>
<section id="summary">Deterministic filesystem state management in Rust.</section>
<section id="changelog"><ul><li>feat: add frame sets</li></ul></section>
<section id="status-badge">v1.1.0</section>
<!-- MANUAL:notes -->
<p>These notes were written by hand.</p>
<!-- /MANUAL:notes -->
</main>
</body>
</html>"#;

/// Create the standard published page document
pub fn published_page() -> PageDocument {
    PageDocument::new(PUBLISHED_PAGE)
}

/// Create a project context with recent activity
pub fn active_context(slug: &str) -> ProjectContext {
    ProjectContext {
        slug: slug.to_string(),
        repo: format!("octo/{}", slug),
        status: ProjectStatus::Update,
        change_score: 130,
        change_reason: "release_tag".to_string(),
        description: "Deterministic filesystem state management".to_string(),
        stars: 42,
        forks: 3,
        commits: vec![CommitInfo {
            sha: "abc1234".to_string(),
            date: "2025-06-01".to_string(),
            message: "feat: add frame sets".to_string(),
            commit_type: CommitType::Feat,
            author: "dev".to_string(),
        }],
        releases: vec![ReleaseInfo {
            tag: "v1.1.0".to_string(),
            name: "v1.1.0".to_string(),
            date: Some("2025-05-28".to_string()),
            notes: "Adds frame sets".to_string(),
            prerelease: false,
        }],
        languages: vec!["Rust".to_string()],
        readme_excerpt: "Meld manages filesystem state deterministically.".to_string(),
        page: PageState {
            exists: true,
            locked: false,
            path: Some("projects/meld.html".to_string()),
            sha: Some("blob123".to_string()),
            content: Some(PUBLISHED_PAGE.to_string()),
            last_deploy: None,
        },
    }
}

/// Create a project context with no recent activity
pub fn quiet_context(slug: &str) -> ProjectContext {
    let mut context = active_context(slug);
    context.commits.clear();
    context.releases.clear();
    context.change_score = 0;
    context.change_reason = "no_activity".to_string();
    context
}
