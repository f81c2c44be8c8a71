/*!
 * Error types for the pagesmith application.
 *
 * This module contains custom error types for different parts of the
 * application, using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Structural errors raised while parsing or verifying page documents.
///
/// A malformed published page is never repaired by guessing; it aborts
/// the pipeline run for that project.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// An opening manual marker has no matching closing marker
    #[error("Unmatched manual marker '{id}' (opened, never closed)")]
    UnmatchedMarker {
        /// Manual region identifier
        id: String,
    },

    /// A closing manual marker appeared without a matching opener
    #[error("Stray closing manual marker '{id}'")]
    StrayClosingMarker {
        /// Manual region identifier
        id: String,
    },

    /// The same manual region identifier is declared more than once
    #[error("Duplicate manual region '{id}'")]
    DuplicateRegion {
        /// Manual region identifier
        id: String,
    },

    /// A manual region opened inside another manual region
    #[error("Manual region '{inner}' opened inside region '{outer}'")]
    OverlappingRegions {
        /// Region opened first
        outer: String,
        /// Region opened inside the first
        inner: String,
    },
}

/// Errors that can occur during a draft-then-review pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Structural problem in the published document or the candidate
    #[error("Structural error: {0}")]
    Structural(#[from] DocumentError),

    /// A stage exceeded the caller-supplied deadline
    #[error("Stage '{stage}' timed out after {timeout_secs}s")]
    Timeout {
        /// Which stage expired (draft / review)
        stage: &'static str,
        /// The deadline that was exceeded
        timeout_secs: u64,
    },

    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider returned no usable document
    #[error("Drafter produced an empty candidate")]
    EmptyDraft,

    /// A stage task failed for an internal reason (e.g. a panic)
    #[error("Internal pipeline failure: {0}")]
    Internal(String),
}

/// Errors from GitHub API interactions
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Error when making an API request fails
    #[error("GitHub request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the API itself
    #[error("GitHub API error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading or validation
    #[error("Config error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from page document processing
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from a pipeline run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from the GitHub API
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
