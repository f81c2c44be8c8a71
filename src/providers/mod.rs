/*!
 * Provider implementations for page generation services.
 *
 * This module contains client implementations for the LLM providers that
 * back the drafter:
 * - Ollama: Local LLM server
 * - Anthropic: Anthropic API integration
 *
 * A mock provider is available for tests.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must
/// follow, allowing them to be used interchangeably by the draft engine.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    ///
    /// # Arguments
    /// * `response` - The response from the provider
    ///
    /// # Returns
    /// * `String` - The extracted text
    fn extract_text(response: &Self::Response) -> String;
}

/// Compute a jittered exponential backoff delay for a retry attempt.
///
/// Base doubles per attempt; up to 25% random jitter is added so
/// concurrent pipelines do not retry in lockstep.
pub fn backoff_delay(base_ms: u64, attempt: u32) -> std::time::Duration {
    use rand::Rng;

    let exp = base_ms.saturating_mul(1u64 << attempt.min(8));
    let jitter = rand::rng().random_range(0..=exp / 4 + 1);
    std::time::Duration::from_millis(exp.saturating_add(jitter))
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
