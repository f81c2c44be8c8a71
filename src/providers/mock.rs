/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different drafting
 * behaviors:
 * - `MockProvider::working()` - Always succeeds with a minimal valid page
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::empty()` - Returns an empty response
 * - `MockProvider::promotional()` - Returns a page salted with marketing words
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The full drafting prompt
    pub prompt: String,
    /// Project slug the draft is for
    pub slug: String,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The generated page text
    pub text: String,
    /// Simulated prompt tokens
    pub prompt_tokens: Option<u64>,
    /// Simulated completion tokens
    pub completion_tokens: Option<u64>,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a minimal valid page
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns an empty response
    Empty,
    /// Returns a page containing promotional language
    Promotional,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing drafting behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that returns promotional copy
    pub fn promotional() -> Self {
        Self::new(MockBehavior::Promotional)
    }

    /// Create a slow mock for timeout testing
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Generate a minimal page that satisfies the default required sections
    pub fn generate_page(slug: &str, summary: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<body>
<main>
<h1>{slug}</h1>
<section id="summary">{summary}</section>
<section id="changelog"><ul><li>No recent updates.</li></ul></section>
<section id="status-badge">No releases yet.</section>
</main>
</body>
</html>"#
        )
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => {
                // Use custom response if set, otherwise generate default
                let text = if let Some(generator) = self.custom_response {
                    generator(&request)
                } else {
                    Self::generate_page(&request.slug, "A small, factual summary.")
                };

                Ok(MockResponse {
                    text,
                    prompt_tokens: Some(request.prompt.len() as u64),
                    completion_tokens: Some((request.prompt.len() / 2) as u64),
                })
            }

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(MockResponse {
                        text: Self::generate_page(&request.slug, "A small, factual summary."),
                        prompt_tokens: Some(10),
                        completion_tokens: Some(10),
                    })
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(MockResponse {
                text: String::new(),
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            }),

            MockBehavior::Promotional => Ok(MockResponse {
                text: Self::generate_page(
                    &request.slug,
                    "A revolutionary, groundbreaking tool that changes everything.",
                ),
                prompt_tokens: Some(10),
                completion_tokens: Some(10),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(MockResponse {
                    text: Self::generate_page(&request.slug, "A slow but factual summary."),
                    prompt_tokens: Some(10),
                    completion_tokens: Some(10),
                })
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
