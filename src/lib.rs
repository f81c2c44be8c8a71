/*!
 * # Pagesmith - AI-maintained project pages
 *
 * A Rust library and CLI for maintaining generated project pages on a
 * portfolio site using LLM drafting with deterministic review.
 *
 * ## Features
 *
 * - Collect project metadata from the GitHub REST API
 * - Score change significance to decide which pages need updates
 * - Draft page updates using an LLM provider:
 *   - Ollama (local LLM)
 *   - Anthropic API
 * - Review every draft deterministically against policy and source of
 *   truth (manual regions, forbidden words, claim traceability, diff
 *   proportionality)
 * - Deploy approved drafts by direct push or pull request
 * - Record run history, token usage, and cost
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `page`: Page documents and manual region parsing
 * - `collector`: GitHub metadata collection and significance scoring
 * - `drafter`: Prompt construction and the draft stage
 * - `validator`: Review checks and verdict assembly
 * - `pipeline`: The draft-then-review pipeline with stage deadlines
 * - `deployer`: Gatekeeper logic and site repository mutations
 * - `observer`: Run aggregation, cost accounting, and history storage
 * - `providers`: Client implementations for LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::mock`: Mock provider for tests
 * - `file_utils`: Workspace artifact management
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod collector;
pub mod deployer;
pub mod drafter;
pub mod errors;
pub mod file_utils;
pub mod observer;
pub mod page;
pub mod pipeline;
pub mod providers;
pub mod validator;

// Re-export main types for easier usage
pub use app_config::{Config, PolicyConfig};
pub use app_controller::Controller;
pub use collector::models::{CollectionContext, ProjectContext};
pub use errors::{AppError, DocumentError, GitHubError, PipelineError, ProviderError};
pub use page::{ManualRegion, PageDocument};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
pub use validator::{Validator, Verdict, VerdictStatus};
