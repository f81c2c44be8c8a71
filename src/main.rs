// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use crate::app_config::{Config, GenerationProvider};
use crate::app_controller::Controller;
use crate::file_utils::Workspace;
use crate::observer::store::RunStore;

mod app_config;
mod app_controller;
mod collector;
mod deployer;
mod drafter;
mod errors;
mod file_utils;
mod observer;
mod page;
mod pipeline;
mod providers;
mod validator;

/// CLI wrapper for GenerationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliGenerationProvider {
    Ollama,
    Anthropic,
}

impl From<CliGenerationProvider> for GenerationProvider {
    fn from(cli_provider: CliGenerationProvider) -> Self {
        match cli_provider {
            CliGenerationProvider::Ollama => GenerationProvider::Ollama,
            CliGenerationProvider::Anthropic => GenerationProvider::Anthropic,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Run without mutating the site repository or the run history
    #[arg(short, long)]
    dry_run: bool,

    /// Update pages even when no significant change was detected
    #[arg(short, long)]
    force_update: bool,

    /// Generation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliGenerationProvider>,

    /// Model name to use for drafting
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full collect-draft-review-deploy workflow (default command)
    Run(RunArgs),

    /// Collect project metadata and save context.json without drafting
    Collect(RunArgs),

    /// Draft candidate pages from a previously saved context
    Draft(RunArgs),

    /// Review saved drafts and write verdicts
    Review(RunArgs),

    /// Deploy reviewed drafts according to their verdicts
    Deploy(RunArgs),

    /// Generate shell completions for pagesmith
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which part of the workflow to execute
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Full,
    Collect,
    Draft,
    Review,
    Deploy,
}

/// Pagesmith - AI-maintained project pages
///
/// Collects project metadata from GitHub, drafts page updates with an AI
/// provider, reviews every draft against policy, and deploys approved
/// changes to the site repository.
#[derive(Parser, Debug)]
#[command(name = "pagesmith")]
#[command(version = "0.3.0")]
#[command(about = "AI-maintained project pages with deterministic review")]
#[command(long_about = "Pagesmith keeps generated project pages up to date.

EXAMPLES:
    pagesmith run                           # Full workflow with conf.json
    pagesmith run --dry-run                 # No pushes, no PRs, no history
    pagesmith run -p anthropic -m claude-sonnet-4-20250514
    pagesmith collect                       # Only refresh _data/context.json
    pagesmith draft && pagesmith review     # Phase-by-phase over artifacts
    pagesmith deploy --dry-run              # Gate saved verdicts without pushing
    pagesmith completions bash > pagesmith.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different file with --config-path. If the config file doesn't exist,
    a default one will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default: llama3.2:3b)
    anthropic - Anthropic Claude API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    args: RunArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default;
    // the level is updated after the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "pagesmith", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Collect(args)) => run_workflow(args, Phase::Collect).await,
        Some(Commands::Draft(args)) => run_workflow(args, Phase::Draft).await,
        Some(Commands::Review(args)) => run_workflow(args, Phase::Review).await,
        Some(Commands::Deploy(args)) => run_workflow(args, Phase::Deploy).await,
        Some(Commands::Run(args)) => run_workflow(args, Phase::Full).await,
        // Default behavior: top-level args drive a full run
        None => run_workflow(cli.args, Phase::Full).await,
    }
}

/// Load configuration, applying CLI overrides, creating defaults if needed
fn load_config(args: &RunArgs) -> Result<Config> {
    let config_path = &args.config_path;

    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(provider) = &args.provider {
        config.generation.provider = provider.clone().into();
    }

    if let Some(model) = &args.model {
        let provider_str = config.generation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .generation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(log_level) = &args.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

async fn run_workflow(args: RunArgs, phase: Phase) -> Result<()> {
    let config = load_config(&args)?;

    config
        .validate()
        .context("Configuration validation failed")?;

    log::set_max_level(level_filter(&config.log_level));

    let mut controller = Controller::with_config(config)?
        .with_workspace(Workspace::new("."))
        .with_dry_run(args.dry_run)
        .with_force_update(args.force_update);

    if !args.dry_run && phase == Phase::Full {
        match RunStore::new_default() {
            Ok(store) => controller = controller.with_store(store),
            Err(e) => warn!("Run history unavailable: {}", e),
        }
    }

    match phase {
        Phase::Collect => {
            let context = controller.run_collect().await?;
            println!(
                "Collected {} projects: {} updates, {} new, {} skipped, {} locked",
                context.summary.total,
                context.summary.updates,
                context.summary.new,
                context.summary.skips,
                context.summary.locked
            );
        }
        Phase::Draft => {
            let drafted = controller.run_draft().await?;
            println!("Drafted {} candidate pages", drafted);
        }
        Phase::Review => {
            let counts = controller.run_review()?;
            println!(
                "Reviewed drafts: {} approved, {} flagged, {} rejected",
                counts.approved, counts.flagged, counts.rejected
            );
        }
        Phase::Deploy => {
            let counts = controller.run_deploy().await?;
            println!(
                "Deployed: {} pushed, {} PRs, {} skipped, {} errors",
                counts.pushed, counts.prs_created, counts.skipped, counts.errors
            );
        }
        Phase::Full => {
            let report = controller.run().await?;
            println!(
                "Run {}: {} pushed, {} PRs, {} skipped, {} errors, cost {}",
                report.run_id,
                report.deploys.pushed,
                report.deploys.prs_created,
                report.deploys.skipped,
                report.deploys.errors + report.draft_errors,
                report.cost.total_formatted()
            );
        }
    }

    Ok(())
}
