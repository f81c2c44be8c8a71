/*!
 * Draft engine: provider dispatch and the draft pipeline stage.
 *
 * `DraftService` wraps the configured LLM provider behind one completion
 * call; `Drafter` implements the stage contract around it: structural
 * validation of the published page, prompt construction, response
 * cleanup, manual region re-injection, and the deploy stamp.
 */

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::{GenerationConfig, GenerationProvider, PolicyConfig};
use crate::collector::models::ProjectContext;
use crate::drafter::prompts::{render_system_prompt, DraftPromptBuilder};
use crate::drafter::{TokenUsage, UsageTracker};
use crate::errors::{PipelineError, ProviderError};
use crate::page::PageDocument;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::Provider;

/// Markdown fence opener sometimes wrapped around model output
static FENCE_OPEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```(?:html)?\s*\n").expect("Invalid fence open regex"));

/// Markdown fence closer
static FENCE_CLOSE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\n```\s*$").expect("Invalid fence close regex"));

/// Base page used as the "published" input for brand-new projects
pub const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{PROJECT_NAME}} - Portfolio</title>
</head>
<body>
    <main>
        <h1>{{PROJECT_NAME}}</h1>
        <section id="summary">
            <!-- Project summary goes here -->
        </section>
        <section id="changelog">
            <!-- Recent updates go here -->
        </section>
        <section id="status-badge">
            <!-- Status badge goes here -->
        </section>
        <!-- MANUAL:custom -->
        <!-- Add custom content here -->
        <!-- /MANUAL:custom -->
    </main>
</body>
</html>"#;

/// Build the base page for a new project
pub fn base_page(slug: &str) -> PageDocument {
    PageDocument::new(BASE_TEMPLATE.replace("{{PROJECT_NAME}}", slug))
}

/// The configured provider behind the draft service
enum DraftProviderImpl {
    /// Ollama local server
    Ollama { client: Ollama },
    /// Anthropic API
    Anthropic { client: Anthropic },
    /// Mock provider for tests
    Mock { client: MockProvider },
}

/// Completion service dispatching to the configured provider
pub struct DraftService {
    provider: DraftProviderImpl,
    model: String,
    temperature: f32,
    max_tokens: u32,
    usage: Arc<UsageTracker>,
}

impl DraftService {
    /// Create a draft service from generation configuration
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let common = &config.common;

        let provider = match config.provider {
            GenerationProvider::Ollama => DraftProviderImpl::Ollama {
                client: Ollama::new_with_config(
                    config.get_endpoint(),
                    config.get_timeout_secs(),
                    common.retry_count,
                    common.retry_backoff_ms,
                ),
            },
            GenerationProvider::Anthropic => DraftProviderImpl::Anthropic {
                client: Anthropic::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    config.get_timeout_secs(),
                    common.retry_count,
                    common.retry_backoff_ms,
                ),
            },
        };

        Ok(Self {
            provider,
            model: config.get_model(),
            temperature: common.temperature,
            max_tokens: config.get_max_tokens(),
            usage: Arc::new(UsageTracker::new()),
        })
    }

    /// Create a draft service backed by a mock provider (tests)
    pub fn with_mock(client: MockProvider) -> Self {
        Self {
            provider: DraftProviderImpl::Mock { client },
            model: "mock".to_string(),
            temperature: 0.0,
            max_tokens: 8192,
            usage: Arc::new(UsageTracker::new()),
        }
    }

    /// Token usage accumulated so far
    pub fn usage(&self) -> TokenUsage {
        self.usage.snapshot()
    }

    /// Test connectivity to the configured provider
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.provider {
            DraftProviderImpl::Ollama { client } => client.test_connection().await,
            DraftProviderImpl::Anthropic { client } => client.test_connection().await,
            DraftProviderImpl::Mock { client } => client.test_connection().await,
        }
    }

    /// Run one completion and return the raw response text
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        slug: &str,
    ) -> Result<String, ProviderError> {
        match &self.provider {
            DraftProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(&self.model, prompt)
                    .system(system)
                    .temperature(self.temperature)
                    .num_predict(self.max_tokens);

                let response = client.generate(request).await?;
                self.usage.record(
                    response.prompt_eval_count.unwrap_or(0),
                    response.eval_count.unwrap_or(0),
                );
                Ok(response.response)
            }
            DraftProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(&self.model, self.max_tokens)
                    .system(system)
                    .temperature(self.temperature)
                    .add_message("user", prompt);

                let response = client.complete_request(request).await?;
                self.usage
                    .record(response.usage.input_tokens, response.usage.output_tokens);
                Ok(Anthropic::extract_text_from_response(&response))
            }
            DraftProviderImpl::Mock { client } => {
                let request = MockRequest {
                    prompt: format!("{}\n\n{}", system, prompt),
                    slug: slug.to_string(),
                };

                let response = client.complete(request).await?;
                self.usage.record(
                    response.prompt_tokens.unwrap_or(0),
                    response.completion_tokens.unwrap_or(0),
                );
                Ok(response.text)
            }
        }
    }
}

/// The draft pipeline stage.
///
/// Stateless between calls: every invocation derives everything from its
/// arguments and the configured service.
pub struct Drafter {
    service: DraftService,
}

impl Drafter {
    /// Create a drafter around a completion service
    pub fn new(service: DraftService) -> Self {
        Self { service }
    }

    /// Access the underlying service (for usage totals)
    pub fn service(&self) -> &DraftService {
        &self.service
    }

    /// Produce a candidate page for a project.
    ///
    /// Fails with a structural error before any provider call when the
    /// published page has unmatched manual markers. Never returns a
    /// partial document: empty responses are an error.
    pub async fn draft(
        &self,
        context: &ProjectContext,
        policy: &PolicyConfig,
        published: &PageDocument,
    ) -> Result<PageDocument, PipelineError> {
        // Malformed input is refused, not repaired
        let regions = published.manual_regions()?;

        let system = render_system_prompt(policy);
        let prompt = DraftPromptBuilder::new(context, published.html()).build();

        debug!(
            "Drafting {} ({} manual regions, {} prompt chars)",
            context.slug,
            regions.len(),
            prompt.len()
        );

        let response = self.service.complete(&system, &prompt, &context.slug).await?;
        let cleaned = clean_html_response(&response);

        if cleaned.trim().is_empty() {
            return Err(PipelineError::EmptyDraft);
        }

        let candidate = PageDocument::new(cleaned)
            .inject_manual_regions(&regions)
            .with_deploy_marker(&Utc::now().format("%Y-%m-%d").to_string());

        info!("Drafted candidate for {}", context.slug);
        Ok(candidate)
    }
}

/// Remove markdown code fence wrappers the model sometimes adds
pub fn clean_html_response(response: &str) -> String {
    let without_open = FENCE_OPEN_REGEX.replace(response, "");
    let without_close = FENCE_CLOSE_REGEX.replace(&without_open, "");
    without_close.trim().to_string()
}
