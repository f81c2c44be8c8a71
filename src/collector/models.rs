/*!
 * Context value objects shared by all pipeline stages.
 *
 * Everything here is an immutable snapshot taken at collection time.
 * The drafter and validator receive these values by reference and never
 * mutate them; a fresh context is collected per run.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Conventional commit prefix matcher ("feat:", "fix(scope):", "chore!:")
static COMMIT_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w+)(?:\([^)]+\))?!?:").expect("Invalid commit type regex")
});

/// Conventional commit classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Chore,
    Other,
}

impl CommitType {
    /// Classify a commit message by its conventional-commit prefix.
    ///
    /// Unprefixed or unrecognized messages classify as `Other`. Common
    /// aliases are normalized (feature -> feat, bugfix -> fix,
    /// build/ci -> chore).
    pub fn parse_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let Some(cap) = COMMIT_TYPE_REGEX.captures(&lower) else {
            return Self::Other;
        };

        match &cap[1] {
            "feat" | "feature" => Self::Feat,
            "fix" | "bugfix" => Self::Fix,
            "docs" | "doc" => Self::Docs,
            "style" => Self::Style,
            "refactor" => Self::Refactor,
            "perf" => Self::Perf,
            "test" | "tests" => Self::Test,
            "chore" | "build" | "ci" => Self::Chore,
            _ => Self::Other,
        }
    }
}

/// A recent commit carried into the context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Abbreviated commit sha
    pub sha: String,
    /// Commit date (YYYY-MM-DD)
    pub date: String,
    /// First line of the commit message
    pub message: String,
    /// Conventional commit classification
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    /// Commit author name
    pub author: String,
}

/// A release carried into the context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Release tag (e.g. "v1.2.0")
    pub tag: String,
    /// Release display name, falling back to the tag
    pub name: String,
    /// Publication date (YYYY-MM-DD), if published
    pub date: Option<String>,
    /// Leading release notes excerpt
    pub notes: String,
    /// Whether this is a prerelease
    pub prerelease: bool,
}

/// State of the published page for a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageState {
    /// Whether a page exists in the site repository
    pub exists: bool,
    /// Whether the page carries the lock marker
    pub locked: bool,
    /// Path of the page inside the site repository
    pub path: Option<String>,
    /// Git blob sha of the page at collection time
    pub sha: Option<String>,
    /// Raw page HTML at collection time
    pub content: Option<String>,
    /// Last deployment date stamp, if present
    pub last_deploy: Option<String>,
}

/// What the collector decided about a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// No page exists yet; one must be drafted from the base template
    New,
    /// The page exists and has enough new signal to update
    Update,
    /// Nothing significant changed (or the page is locked)
    Skip,
    /// Collection failed for this project
    Error,
}

/// The full collected context for a single project.
///
/// Invariants: `languages` has no duplicates and is ordered by usage;
/// `commits` only contains items within the configured trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Page slug (the repository name)
    pub slug: String,
    /// Repository in `owner/name` form
    pub repo: String,
    /// Collector decision
    pub status: ProjectStatus,
    /// Change significance score
    pub change_score: i32,
    /// Primary reason for the decision
    pub change_reason: String,
    /// Repository description
    pub description: String,
    /// Star count
    pub stars: u32,
    /// Fork count
    pub forks: u32,
    /// Recent commits, most recent first
    pub commits: Vec<CommitInfo>,
    /// Recent releases, most recent first
    pub releases: Vec<ReleaseInfo>,
    /// Languages by usage, descending, no duplicates
    pub languages: Vec<String>,
    /// Leading README excerpt
    pub readme_excerpt: String,
    /// Published page state
    pub page: PageState,
}

impl ProjectContext {
    /// Context for a project whose collection failed
    pub fn error(slug: &str, repo: &str, reason: String) -> Self {
        Self {
            slug: slug.to_string(),
            repo: repo.to_string(),
            status: ProjectStatus::Error,
            change_score: 0,
            change_reason: format!("fetch_error: {}", reason),
            description: String::new(),
            stars: 0,
            forks: 0,
            commits: Vec::new(),
            releases: Vec::new(),
            languages: Vec::new(),
            readme_excerpt: String::new(),
            page: PageState::default(),
        }
    }

    /// Context for a project skipped before collection (e.g. locked)
    pub fn skipped(slug: &str, repo: &str, page: PageState, reason: &str) -> Self {
        Self {
            slug: slug.to_string(),
            repo: repo.to_string(),
            status: ProjectStatus::Skip,
            change_score: 0,
            change_reason: reason.to_string(),
            description: String::new(),
            stars: 0,
            forks: 0,
            commits: Vec::new(),
            releases: Vec::new(),
            languages: Vec::new(),
            readme_excerpt: String::new(),
            page,
        }
    }

    /// The latest release, if any
    pub fn latest_release(&self) -> Option<&ReleaseInfo> {
        self.releases.first()
    }

    /// Whether this project needs a draft
    pub fn needs_draft(&self) -> bool {
        matches!(self.status, ProjectStatus::New | ProjectStatus::Update)
    }

    /// Whether the project produced any new signal this window
    pub fn is_quiet(&self) -> bool {
        self.commits.is_empty() && self.releases.is_empty()
    }
}

/// Per-run summary counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub total: usize,
    pub updates: usize,
    pub new: usize,
    pub skips: usize,
    pub locked: usize,
    pub errors: usize,
}

impl CollectionSummary {
    /// Whether any project needs drafting
    pub fn has_updates(&self) -> bool {
        self.updates + self.new > 0
    }
}

/// The collector's full output, serialized to `_data/context.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionContext {
    /// RFC 3339 generation timestamp
    pub generated_at: String,
    /// Short hash of the configuration used
    pub config_hash: String,
    /// Per-project contexts
    pub projects: Vec<ProjectContext>,
    /// Summary counters
    pub summary: CollectionSummary,
}

impl CollectionContext {
    /// Find a project context by slug
    pub fn find_project(&self, slug: &str) -> Option<&ProjectContext> {
        self.projects.iter().find(|p| p.slug == slug)
    }
}
