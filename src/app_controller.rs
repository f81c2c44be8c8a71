use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::sync::Arc;

use crate::app_config::Config;
use crate::collector::github::GitHubClient;
use crate::collector::models::{CollectionContext, PageState, ProjectContext};
use crate::collector::Collector;
use crate::deployer::{DeployAction, Deployer};
use crate::drafter::engine::base_page;
use crate::drafter::{DraftService, Drafter};
use crate::errors::PipelineError;
use crate::file_utils::Workspace;
use crate::observer::store::{RunRecord, RunStore};
use crate::observer::{DeployCounts, ProjectOutcome, ReviewCounts, RunReport};
use crate::page::PageDocument;
use crate::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
use crate::validator::{Validator, Verdict, VerdictStatus};

// @module: Application controller for the page maintenance workflow

/// Result of one project's draft-then-review attempt
struct ProjectRunResult {
    slug: String,
    page_state: PageState,
    outcome: Result<PipelineOutcome, PipelineError>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Artifact workspace
    workspace: Workspace,
    // @field: Run history store (absent in dry runs)
    store: Option<RunStore>,
    dry_run: bool,
    force_update: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            workspace: Workspace::new("."),
            store: None,
            dry_run: false,
            force_update: false,
        })
    }

    /// Set the artifact workspace root
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = workspace;
        self
    }

    /// Attach a run history store
    pub fn with_store(mut self, store: RunStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Enable dry-run mode (no site mutations, no history writes)
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Promote skip decisions to updates for this run
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    fn github(&self) -> GitHubClient {
        GitHubClient::new(None)
    }

    /// Run only the collection phase and persist the context
    pub async fn run_collect(&self) -> Result<CollectionContext> {
        let collector = Collector::new(self.config.clone(), self.github())
            .with_force_update(self.force_update);

        let context = collector.run().await?;
        self.workspace
            .write_json(&self.workspace.context_path(), &context)
            .context("Failed to save context.json")?;

        Ok(context)
    }

    /// Load the collection context saved by a previous collect phase
    fn load_context(&self) -> Result<CollectionContext> {
        self.workspace
            .read_json(&self.workspace.context_path())?
            .ok_or_else(|| anyhow::anyhow!("No context.json found. Run collect first."))
    }

    /// The published page for a project, or the base template for new ones
    fn published_page(project: &ProjectContext) -> PageDocument {
        match &project.page.content {
            Some(html) => PageDocument::new(html.clone()),
            None => base_page(&project.slug),
        }
    }

    fn build_pipeline(&self) -> Result<Pipeline> {
        let service = DraftService::from_config(&self.config.generation)?;
        Ok(Pipeline::new(
            Drafter::new(service),
            Validator::new(self.config.review.clone()),
            PipelineConfig::from(&self.config.generation.common),
        ))
    }

    /// Draft candidates for every project that needs one, from the saved
    /// context. Phase command; the full `run` drafts in memory instead.
    pub async fn run_draft(&self) -> Result<usize> {
        let context = self.load_context()?;
        let drafter = Drafter::new(DraftService::from_config(&self.config.generation)?);

        let mut drafted = 0;
        for project in context.projects.iter().filter(|p| p.needs_draft()) {
            let published = Self::published_page(project);
            match drafter.draft(project, &self.config.policy, &published).await {
                Ok(candidate) => {
                    self.workspace.write_text(
                        &self.workspace.draft_path(&project.slug),
                        candidate.html(),
                    )?;
                    info!("Drafted {}", project.slug);
                    drafted += 1;
                }
                Err(e) => error!("Draft failed for {}: {}", project.slug, e),
            }
        }

        Ok(drafted)
    }

    /// Review every saved draft against the saved context
    pub fn run_review(&self) -> Result<ReviewCounts> {
        let context = self.load_context()?;
        let validator = Validator::new(self.config.review.clone());
        let mut counts = ReviewCounts::default();

        for slug in self.workspace.list_draft_slugs()? {
            let Some(project) = context.find_project(&slug) else {
                warn!("No context found for draft {}", slug);
                continue;
            };

            let draft = PageDocument::new(
                self.workspace.read_text(&self.workspace.draft_path(&slug))?,
            );
            let published = Self::published_page(project);

            let verdict =
                validator.review(project, &self.config.policy, &published, &draft)?;
            match verdict.status {
                VerdictStatus::Approve => counts.approved += 1,
                VerdictStatus::Flagged => counts.flagged += 1,
                VerdictStatus::Reject => counts.rejected += 1,
            }
            info!("Reviewed {}: {:?} - {}", slug, verdict.status, verdict.reason);

            self.workspace
                .write_json(&self.workspace.verdict_path(&slug), &verdict)?;
        }

        Ok(counts)
    }

    /// Deploy every reviewed draft according to its saved verdict
    pub async fn run_deploy(&self) -> Result<DeployCounts> {
        let context = self.load_context()?;
        let deployer = Deployer::new(
            self.github(),
            &self.config.target.repo,
            &self.config.target.branch,
            &self.config.target.output_dir,
            self.config.workflow.clone(),
        )
        .with_dry_run(self.dry_run);

        let mut counts = DeployCounts::default();
        for slug in self.workspace.list_draft_slugs()? {
            let verdict: Option<Verdict> =
                self.workspace.read_json(&self.workspace.verdict_path(&slug))?;
            let Some(verdict) = verdict else {
                warn!("No verdict for draft {}, skipping", slug);
                continue;
            };
            let Some(project) = context.find_project(&slug) else {
                warn!("No context found for draft {}", slug);
                continue;
            };

            let candidate = PageDocument::new(
                self.workspace.read_text(&self.workspace.draft_path(&slug))?,
            );

            match deployer.deploy(&slug, &candidate, &verdict, &project.page).await {
                Ok(DeployAction::Pushed) => counts.pushed += 1,
                Ok(DeployAction::PullRequest { url }) => {
                    info!("PR for {}: {}", slug, url);
                    counts.prs_created += 1;
                }
                Ok(DeployAction::Skipped { reason }) => {
                    info!("Skipped {}: {}", slug, reason);
                    counts.skipped += 1;
                }
                Err(e) => {
                    error!("Deploy failed for {}: {}", slug, e);
                    counts.errors += 1;
                }
            }
        }

        Ok(counts)
    }

    /// Draft and review every project that needs it, concurrently.
    ///
    /// Each project runs its own isolated draft-then-review attempt; the
    /// only shared state is the usage counter inside the draft service.
    async fn run_pipelines(
        &self,
        pipeline: Arc<Pipeline>,
        projects: Vec<ProjectContext>,
    ) -> Vec<ProjectRunResult> {
        let policy = self.config.policy.clone();
        let concurrency = self.config.generation.optimal_concurrent_requests();

        let progress = ProgressBar::new(projects.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let results: Vec<ProjectRunResult> = stream::iter(projects)
            .map(|project| {
                let pipeline = Arc::clone(&pipeline);
                let policy = policy.clone();
                let progress = progress.clone();

                async move {
                    let published = Self::published_page(&project);
                    let outcome = pipeline.run(&project, &policy, &published).await;

                    progress.set_message(project.slug.clone());
                    progress.inc(1);

                    ProjectRunResult {
                        slug: project.slug.clone(),
                        page_state: project.page.clone(),
                        outcome,
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        progress.finish_and_clear();
        results
    }

    /// Persist the draft and verdict artifacts for one result
    fn save_artifacts(&self, result: &ProjectRunResult) -> Result<()> {
        if let Ok(outcome) = &result.outcome {
            self.workspace.write_text(
                &self.workspace.draft_path(&result.slug),
                outcome.candidate.html(),
            )?;
            self.workspace
                .write_json(&self.workspace.verdict_path(&result.slug), &outcome.verdict)?;
        }
        Ok(())
    }

    /// Run the complete workflow: collect, draft, review, deploy, report
    pub async fn run(&self) -> Result<RunReport> {
        let now = chrono::Utc::now();
        let mut report = RunReport::new(
            RunReport::make_run_id(&now),
            now.to_rfc3339(),
            self.dry_run,
        );

        self.workspace.ensure_layout()?;

        // Phase 1: collect
        let context = self.run_collect().await?;
        report.collected = context.summary.clone();

        if !context.summary.has_updates() {
            info!("Nothing to update");
            report.finalize();
            self.finish_run(&report, &[]).await?;
            return Ok(report);
        }

        // Phase 2+3: draft and review
        let pipeline = Arc::new(self.build_pipeline()?);
        let to_draft: Vec<ProjectContext> = context
            .projects
            .iter()
            .filter(|p| p.needs_draft())
            .cloned()
            .collect();

        info!("{} projects to draft", to_draft.len());
        let results = self.run_pipelines(Arc::clone(&pipeline), to_draft).await;

        report.usage = pipeline.drafter().service().usage();

        let mut reviewed: Vec<(String, PageState, PageDocument, Verdict)> = Vec::new();
        for result in &results {
            self.save_artifacts(result)?;

            match &result.outcome {
                Ok(outcome) => {
                    report.drafted += 1;
                    match outcome.verdict.status {
                        VerdictStatus::Approve => report.reviews.approved += 1,
                        VerdictStatus::Flagged => report.reviews.flagged += 1,
                        VerdictStatus::Reject => report.reviews.rejected += 1,
                    }
                    reviewed.push((
                        result.slug.clone(),
                        result.page_state.clone(),
                        outcome.candidate.clone(),
                        outcome.verdict.clone(),
                    ));
                }
                Err(e) => {
                    error!("Pipeline failed for {}: {}", result.slug, e);
                    report.draft_errors += 1;
                    report.outcomes.push(ProjectOutcome {
                        slug: result.slug.clone(),
                        disposition: "error".to_string(),
                        detail: e.to_string(),
                    });
                }
            }
        }

        // Phase 4: deploy
        let deployer = Deployer::new(
            self.github(),
            &self.config.target.repo,
            &self.config.target.branch,
            &self.config.target.output_dir,
            self.config.workflow.clone(),
        )
        .with_dry_run(self.dry_run);

        for (slug, page_state, candidate, verdict) in &reviewed {
            match deployer.deploy(slug, candidate, verdict, page_state).await {
                Ok(DeployAction::Pushed) => {
                    report.deploys.pushed += 1;
                    report.outcomes.push(ProjectOutcome {
                        slug: slug.clone(),
                        disposition: "pushed".to_string(),
                        detail: String::new(),
                    });
                }
                Ok(DeployAction::PullRequest { url }) => {
                    report.deploys.prs_created += 1;
                    report.outcomes.push(ProjectOutcome {
                        slug: slug.clone(),
                        disposition: "pr".to_string(),
                        detail: url,
                    });
                }
                Ok(DeployAction::Skipped { reason }) => {
                    report.deploys.skipped += 1;
                    report.outcomes.push(ProjectOutcome {
                        slug: slug.clone(),
                        disposition: "skipped".to_string(),
                        detail: reason,
                    });
                }
                Err(e) => {
                    error!("Deploy failed for {}: {}", slug, e);
                    report.deploys.errors += 1;
                    report.outcomes.push(ProjectOutcome {
                        slug: slug.clone(),
                        disposition: "error".to_string(),
                        detail: e.to_string(),
                    });
                }
            }
        }

        // Phase 5: observe
        report.finalize();
        self.finish_run(&report, &reviewed).await?;

        info!(
            "Run {} complete: {} pushed, {} PRs, {} skipped, cost {}",
            report.run_id,
            report.deploys.pushed,
            report.deploys.prs_created,
            report.deploys.skipped,
            report.cost.total_formatted()
        );

        Ok(report)
    }

    /// Write the summary report and record the run in the history store
    async fn finish_run(
        &self,
        report: &RunReport,
        reviewed: &[(String, PageState, PageDocument, Verdict)],
    ) -> Result<()> {
        self.workspace.write_text(
            &self.workspace.report_path(&report.run_id),
            &report.render_markdown(),
        )?;

        if self.dry_run {
            return Ok(());
        }

        if let Some(store) = &self.store {
            store
                .record_run(&RunRecord::from_report(report))
                .await
                .context("Failed to record run")?;

            for (slug, _, _, verdict) in reviewed {
                if let Err(e) = store.record_review(&report.run_id, slug, verdict).await {
                    warn!("Failed to record review for {}: {}", slug, e);
                }
            }
        }

        Ok(())
    }
}
