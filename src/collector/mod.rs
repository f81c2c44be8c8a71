/*!
 * Collector for project metadata and published page state.
 *
 * The collector gathers everything downstream stages are allowed to know:
 * - GitHub REST API data (repo, commits, releases, languages, README)
 * - the published page for each project from the site repository
 * - a change significance score deciding whether a page needs an update
 *
 * Its output is the source of truth: no later stage may introduce a claim
 * that cannot be traced back to it.
 *
 * # Architecture
 *
 * - `models`: Context value objects shared by all stages
 * - `github`: GitHub REST API client and site repository reader
 * - `significance`: Weighted change scoring
 */

pub mod github;
pub mod models;
pub mod significance;

use anyhow::{Context as AnyhowContext, Result};
use chrono::Utc;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::app_config::Config;

use github::{GitHubClient, SiteClient};
use models::{CollectionContext, CollectionSummary, PageState, ProjectContext, ProjectStatus};
use significance::Significance;

/// Collector for a configured set of projects
pub struct Collector {
    config: Config,
    github: GitHubClient,
    site: SiteClient,
    /// Promote Skip results to Update
    force_update: bool,
}

impl Collector {
    /// Create a collector from configuration
    pub fn new(config: Config, github: GitHubClient) -> Self {
        let site = SiteClient::new(
            github.clone(),
            config.target.repo.clone(),
            config.target.branch.clone(),
        );

        Self {
            config,
            github,
            site,
            force_update: false,
        }
    }

    /// Promote Skip results to Update for this run
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    /// Discover projects via the configured method.
    ///
    /// Topic discovery falls back to the static list when the search
    /// returns nothing or fails.
    pub async fn discover_projects(&self) -> Vec<String> {
        use crate::app_config::DiscoveryMethod;

        let discovery = &self.config.discovery;

        if discovery.method == DiscoveryMethod::List {
            debug!("Using static project list");
            return discovery.fallback_list.clone();
        }

        debug!("Searching for repos with topic: {}", discovery.topic_tag);
        match self
            .github
            .search_repos_by_topic(&discovery.owner, &discovery.topic_tag)
            .await
        {
            Ok(repos) if !repos.is_empty() => repos,
            Ok(_) => {
                warn!("No repos found for topic, using fallback list");
                discovery.fallback_list.clone()
            }
            Err(e) => {
                warn!("Discovery failed: {}, using fallback list", e);
                discovery.fallback_list.clone()
            }
        }
    }

    /// Run the full collection and assemble the context for downstream stages
    pub async fn run(&self) -> Result<CollectionContext> {
        let projects = self.discover_projects().await;
        info!("Found {} projects to check", projects.len());

        let page_index = self
            .site
            .page_index(&self.config.target.output_dir)
            .await
            .context("Failed to index published pages")?;
        info!("Site has {} existing project pages", page_index.len());

        let mut context = CollectionContext {
            generated_at: Utc::now().to_rfc3339(),
            config_hash: self.config_hash(),
            projects: Vec::new(),
            summary: CollectionSummary::default(),
        };

        for repo_full_name in &projects {
            debug!("Collecting {}", repo_full_name);
            let project = self.collect_project(repo_full_name, &page_index).await;

            match project.status {
                ProjectStatus::New => context.summary.new += 1,
                ProjectStatus::Update => context.summary.updates += 1,
                ProjectStatus::Skip if project.page.locked => context.summary.locked += 1,
                ProjectStatus::Skip => context.summary.skips += 1,
                ProjectStatus::Error => context.summary.errors += 1,
            }
            context.summary.total += 1;
            context.projects.push(project);
        }

        info!(
            "Collection complete: {} updates, {} new, {} skipped, {} locked, {} errors",
            context.summary.updates,
            context.summary.new,
            context.summary.skips,
            context.summary.locked,
            context.summary.errors
        );

        Ok(context)
    }

    /// Collect all data for a single project
    async fn collect_project(
        &self,
        repo_full_name: &str,
        page_index: &std::collections::HashMap<String, PageState>,
    ) -> ProjectContext {
        let (owner, repo) = match repo_full_name.split_once('/') {
            Some(parts) => parts,
            None => {
                return ProjectContext::error(
                    repo_full_name,
                    repo_full_name,
                    format!("Invalid repo name '{}'", repo_full_name),
                );
            }
        };
        let slug = repo.to_string();

        let page_state = page_index.get(&slug).cloned().unwrap_or_default();

        // Locked pages are skipped before any API traffic
        if page_state.locked {
            debug!("{} is locked, skipping", slug);
            return ProjectContext::skipped(&slug, repo_full_name, page_state, "locked");
        }

        let collector_cfg = &self.config.collector;

        let repo_meta = self.github.get_repo(owner, repo).await;
        let commits = self
            .github
            .get_commits(owner, repo, collector_cfg.commits_lookback_days)
            .await;
        let releases = self
            .github
            .get_releases(owner, repo, collector_cfg.max_releases)
            .await;
        let languages = self.github.get_languages(owner, repo).await;
        let readme = self.github.get_readme(owner, repo).await;

        let (repo_meta, commits, releases, languages, readme) =
            match (repo_meta, commits, releases, languages, readme) {
                (Ok(m), Ok(c), Ok(r), Ok(l), Ok(d)) => (m, c, r, l, d),
                (m, c, r, l, d) => {
                    let reason = [
                        m.err().map(|e| e.to_string()),
                        c.err().map(|e| e.to_string()),
                        r.err().map(|e| e.to_string()),
                        l.err().map(|e| e.to_string()),
                        d.err().map(|e| e.to_string()),
                    ]
                    .into_iter()
                    .flatten()
                    .next()
                    .unwrap_or_else(|| "unknown fetch error".to_string());

                    warn!("Failed to fetch data for {}: {}", slug, reason);
                    return ProjectContext::error(&slug, repo_full_name, reason);
                }
            };

        let readme_changed = self.readme_changed(&readme.content, &page_state);

        let significance = Significance::calculate(
            &self.config.scoring,
            &commits,
            !releases.is_empty(),
            readme_changed,
            !page_state.exists,
        );

        let mut status = significance.status;
        let mut change_reason = significance.change_reason.clone();
        if self.force_update && status == ProjectStatus::Skip {
            status = ProjectStatus::Update;
            change_reason = "force_update".to_string();
        }

        let mut excerpt = readme.content;
        excerpt.truncate(
            excerpt
                .char_indices()
                .nth(collector_cfg.readme_excerpt_length)
                .map(|(i, _)| i)
                .unwrap_or(excerpt.len()),
        );

        ProjectContext {
            slug,
            repo: repo_full_name.to_string(),
            status,
            change_score: significance.change_score,
            change_reason,
            description: repo_meta.description.unwrap_or_default(),
            stars: repo_meta.stargazers_count,
            forks: repo_meta.forks_count,
            commits: commits.into_iter().take(collector_cfg.max_commits).collect(),
            releases,
            languages: languages
                .into_iter()
                .take(collector_cfg.max_languages)
                .collect(),
            readme_excerpt: excerpt,
            page: page_state,
        }
    }

    /// Check whether the README should count as changed.
    ///
    /// New pages always count as changed. Existing pages count as changed
    /// whenever a README is present; the site does not record a README
    /// hash to compare against.
    fn readme_changed(&self, readme: &str, page_state: &PageState) -> bool {
        if !page_state.exists {
            return true;
        }

        !readme.is_empty()
    }

    /// Hash of the configuration, recorded in the context for change detection
    fn config_hash(&self) -> String {
        let serialized = serde_json::to_string(&self.config).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..8].to_string()
    }
}
