/*!
 * Deployer: the gatekeeper between verdicts and the live site.
 *
 * Decision table:
 * - Reject (or collection error) -> skip, logged
 * - manual mode -> always a pull request
 * - Flagged -> always a pull request
 * - change percentage above the high-risk threshold -> pull request even
 *   in auto mode
 * - site file modified since collection (stale) -> pull request, so the
 *   conflict surfaces for human review instead of being overwritten
 * - auto mode + Approve -> direct push
 *
 * The caller applies a candidate only through this stage; the pipeline
 * itself never touches the site repository.
 */

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

use crate::app_config::{WorkflowConfig, WorkflowMode};
use crate::collector::github::GitHubClient;
use crate::collector::models::PageState;
use crate::page::PageDocument;
use crate::validator::{Verdict, VerdictStatus};

/// What the deployer did (or would do) for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployAction {
    /// Pushed directly to the target branch
    Pushed,
    /// Opened a pull request
    PullRequest { url: String },
    /// Skipped, with the reason
    Skipped { reason: String },
}

/// Deployer for approved and flagged candidates
pub struct Deployer {
    github: GitHubClient,
    owner: String,
    repo: String,
    branch: String,
    output_dir: String,
    workflow: WorkflowConfig,
    dry_run: bool,
}

impl Deployer {
    /// Create a deployer for the target site repository
    pub fn new(
        github: GitHubClient,
        repo_full_name: &str,
        branch: &str,
        output_dir: &str,
        workflow: WorkflowConfig,
    ) -> Self {
        let (owner, repo) = repo_full_name
            .split_once('/')
            .map(|(o, r)| (o.to_string(), r.to_string()))
            .unwrap_or((String::new(), repo_full_name.to_string()));

        Self {
            github,
            owner,
            repo,
            branch: branch.to_string(),
            output_dir: output_dir.trim_end_matches('/').to_string(),
            workflow,
            dry_run: false,
        }
    }

    /// Switch the deployer into dry-run mode (no site mutations)
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn page_path(&self, slug: &str) -> String {
        format!("{}/{}.html", self.output_dir, slug)
    }

    fn branch_name(slug: &str, date: &str) -> String {
        format!("pagesmith/update-{}-{}", slug, date)
    }

    /// Decide whether a pull request is required instead of a direct push
    pub fn should_create_pr(&self, verdict: &Verdict, stale: bool) -> bool {
        if stale {
            return true;
        }

        if self.workflow.mode == WorkflowMode::Manual {
            return true;
        }

        if verdict.status == VerdictStatus::Flagged {
            return true;
        }

        if self.workflow.force_pr_on_high_risk
            && verdict.change_percentage > self.workflow.high_risk_threshold
        {
            return true;
        }

        false
    }

    /// Whether the published page changed underneath us since collection
    pub fn is_stale(page_state: &PageState, current_html: Option<&str>) -> bool {
        if !page_state.exists {
            // New file: nothing to conflict with
            return false;
        }

        let Some(collected) = &page_state.content else {
            return false;
        };

        match current_html {
            // File deleted while we worked: that is a conflict
            None => true,
            Some(current) => {
                PageDocument::new(current.to_string()).content_hash()
                    != PageDocument::new(collected.clone()).content_hash()
            }
        }
    }

    /// Check current site state for a freshness conflict
    async fn check_freshness(&self, slug: &str, page_state: &PageState) -> Result<bool> {
        if !page_state.exists {
            return Ok(false);
        }

        let current = self
            .github
            .get_file_content(&self.owner, &self.repo, &self.page_path(slug), &self.branch)
            .await?;

        Ok(Self::is_stale(page_state, current.as_deref()))
    }

    /// Deploy one candidate according to its verdict.
    ///
    /// Rejected candidates never reach this far in the controller, but the
    /// check is repeated here so a direct caller cannot deploy one either.
    pub async fn deploy(
        &self,
        slug: &str,
        candidate: &PageDocument,
        verdict: &Verdict,
        page_state: &PageState,
    ) -> Result<DeployAction> {
        if !verdict.is_deployable() {
            info!("Skipping {}: {}", slug, verdict.reason);
            return Ok(DeployAction::Skipped {
                reason: verdict.reason.clone(),
            });
        }

        let stale = self.check_freshness(slug, page_state).await?;
        if stale {
            warn!("Site page for {} changed since collection, forcing PR", slug);
        }

        if self.should_create_pr(verdict, stale) {
            let url = self.create_pull_request(slug, candidate, verdict).await?;
            info!("PR created for {}: {}", slug, url);
            Ok(DeployAction::PullRequest { url })
        } else {
            self.direct_push(slug, candidate).await?;
            info!("Pushed {} to {}", slug, self.branch);
            Ok(DeployAction::Pushed)
        }
    }

    /// Push the candidate directly to the target branch
    async fn direct_push(&self, slug: &str, candidate: &PageDocument) -> Result<()> {
        if self.dry_run {
            info!("[dry-run] would push {} to {}", slug, self.branch);
            return Ok(());
        }

        let path = self.page_path(slug);
        let existing_sha = self
            .github
            .get_content_sha(&self.owner, &self.repo, &path, &self.branch)
            .await?;

        let message = match existing_sha {
            Some(_) => format!("Update {} project page [pagesmith]", slug),
            None => format!("Add {} project page [pagesmith]", slug),
        };

        self.github
            .put_file(
                &self.owner,
                &self.repo,
                &path,
                &self.branch,
                &message,
                candidate.html(),
                existing_sha.as_deref(),
            )
            .await?;

        Ok(())
    }

    /// Create a branch with the candidate and open a pull request
    async fn create_pull_request(
        &self,
        slug: &str,
        candidate: &PageDocument,
        verdict: &Verdict,
    ) -> Result<String> {
        if self.dry_run {
            info!("[dry-run] would open a PR for {}", slug);
            return Ok("https://github.com/dry-run/pr".to_string());
        }

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let branch = Self::branch_name(slug, &date);
        let path = self.page_path(slug);

        let base_sha = self
            .github
            .get_branch_sha(&self.owner, &self.repo, &self.branch)
            .await?;
        self.github
            .create_branch(&self.owner, &self.repo, &branch, &base_sha)
            .await?;

        let existing_sha = self
            .github
            .get_content_sha(&self.owner, &self.repo, &path, &branch)
            .await?;
        let message = match existing_sha {
            Some(_) => format!("Update {} project page [pagesmith]", slug),
            None => format!("Add {} project page [pagesmith]", slug),
        };

        self.github
            .put_file(
                &self.owner,
                &self.repo,
                &path,
                &branch,
                &message,
                candidate.html(),
                existing_sha.as_deref(),
            )
            .await?;

        let url = self
            .github
            .create_pull(
                &self.owner,
                &self.repo,
                &format!("pagesmith: update {}", slug),
                &Self::build_pr_body(slug, verdict),
                &branch,
                &self.branch,
            )
            .await?;

        Ok(url)
    }

    /// Build the pull request description from the verdict
    pub fn build_pr_body(slug: &str, verdict: &Verdict) -> String {
        let mut body = format!(
            "## Generated update: {slug}\n\n\
             **Review verdict**: {:?}\n\
             **Reason**: {}\n\n\
             ### Diff summary\n{}\n\n",
            verdict.status, verdict.reason, verdict.diff_summary
        );

        if !verdict.issues.is_empty() {
            body.push_str("### Issues noted\n");
            for issue in &verdict.issues {
                body.push_str(&format!("- {}\n", issue));
            }
            body.push('\n');
        }

        body.push_str(
            "---\n\nReview the \"Files changed\" tab and merge to deploy.\n\
             This PR was opened automatically by pagesmith.\n",
        );

        body
    }
}
