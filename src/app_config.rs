use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target site repository settings
    pub target: TargetConfig,

    /// Project discovery settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Collector settings
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Change significance scoring weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Content policy
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Review thresholds
    #[serde(default)]
    pub review: ReviewConfig,

    /// Deployment workflow settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Generation config
    pub generation: GenerationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Generation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: Anthropic
    Anthropic,
}

impl GenerationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

// Implement Display trait for GenerationProvider
impl std::fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for GenerationProvider
impl std::str::FromStr for GenerationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Target site repository configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TargetConfig {
    /// Site repository in `owner/name` form
    pub repo: String,

    /// Branch to read from and deploy to
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Directory inside the site repo holding project pages
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            branch: default_branch(),
            output_dir: default_output_dir(),
        }
    }
}

/// How projects are discovered
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMethod {
    /// Search repositories by topic tag
    #[default]
    Topic,
    /// Use the static fallback list only
    List,
}

/// Project discovery configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Discovery method
    #[serde(default)]
    pub method: DiscoveryMethod,

    /// GitHub account owning the projects
    #[serde(default = "String::new")]
    pub owner: String,

    /// Topic tag used for discovery
    #[serde(default = "default_topic_tag")]
    pub topic_tag: String,

    /// Static fallback list of `owner/name` repos
    #[serde(default)]
    pub fallback_list: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            method: DiscoveryMethod::default(),
            owner: String::new(),
            topic_tag: default_topic_tag(),
            fallback_list: Vec::new(),
        }
    }
}

/// Collector configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Trailing window of commits to consider, in days
    #[serde(default = "default_commits_lookback_days")]
    pub commits_lookback_days: i64,

    /// README excerpt length in characters
    #[serde(default = "default_readme_excerpt_length")]
    pub readme_excerpt_length: usize,

    /// Maximum commits carried into the context
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,

    /// Maximum releases carried into the context
    #[serde(default = "default_max_releases")]
    pub max_releases: usize,

    /// Maximum languages carried into the context
    #[serde(default = "default_max_languages")]
    pub max_languages: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            commits_lookback_days: default_commits_lookback_days(),
            readme_excerpt_length: default_readme_excerpt_length(),
            max_commits: default_max_commits(),
            max_releases: default_max_releases(),
            max_languages: default_max_languages(),
        }
    }
}

/// Change significance scoring weights
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Points for a new release
    #[serde(default = "default_new_release_weight")]
    pub new_release: i32,

    /// Points for a changed README
    #[serde(default = "default_readme_changed_weight")]
    pub readme_changed: i32,

    /// Points per feature commit
    #[serde(default = "default_feat_commit_weight")]
    pub feat_commit: i32,

    /// Points per refactor commit
    #[serde(default = "default_refactor_commit_weight")]
    pub refactor_commit: i32,

    /// Points per fix commit
    #[serde(default = "default_fix_commit_weight")]
    pub fix_commit: i32,

    /// Score assigned when there is no activity at all
    #[serde(default = "default_no_commits_weight")]
    pub no_commits: i32,

    /// Minimum score for a page update
    #[serde(default = "default_update_threshold")]
    pub update_threshold: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            new_release: default_new_release_weight(),
            readme_changed: default_readme_changed_weight(),
            feat_commit: default_feat_commit_weight(),
            refactor_commit: default_refactor_commit_weight(),
            fix_commit: default_fix_commit_weight(),
            no_commits: default_no_commits_weight(),
            update_threshold: default_update_threshold(),
        }
    }
}

/// Content policy for generated pages.
///
/// The drafter prompt carries the policy; the validator re-verifies every
/// rule independently of whatever the model claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolicyConfig {
    /// Tone descriptor fed to the prompt (e.g. "neutral, factual")
    #[serde(default = "default_tone")]
    pub tone: String,

    /// Maximum summary length in characters, inclusive bound
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,

    /// Words that must never appear in generated content
    #[serde(default = "default_forbidden_words")]
    pub forbidden_words: Vec<String>,

    /// Element ids that must be present in every page
    #[serde(default = "default_required_sections")]
    pub required_sections: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            max_summary_length: default_max_summary_length(),
            forbidden_words: default_forbidden_words(),
            required_sections: default_required_sections(),
        }
    }
}

/// Review thresholds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewConfig {
    /// Change percentage above which a quiet project (no commits, no
    /// release) is flagged instead of approved
    #[serde(default = "default_quiet_change_threshold")]
    pub quiet_change_threshold: u8,

    /// Margin below the summary length bound (percent of the bound)
    /// treated as suspiciously close
    #[serde(default = "default_summary_boundary_margin")]
    pub summary_boundary_margin: u8,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            quiet_change_threshold: default_quiet_change_threshold(),
            summary_boundary_margin: default_summary_boundary_margin(),
        }
    }
}

/// Deployment workflow mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    /// Approved drafts push directly; flagged drafts open a PR
    Auto,
    /// Every draft opens a PR
    #[default]
    Manual,
}

/// Deployment workflow configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkflowConfig {
    /// Deployment mode
    #[serde(default)]
    pub mode: WorkflowMode,

    /// Force a PR for high-risk changes even in auto mode
    #[serde(default = "default_true")]
    pub force_pr_on_high_risk: bool,

    /// Change percentage above which a change counts as high risk
    #[serde(default = "default_high_risk_threshold")]
    pub high_risk_threshold: u8,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            mode: WorkflowMode::default(),
            force_pr_on_high_risk: default_true(),
            high_risk_threshold: default_high_risk_threshold(),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max concurrent project pipelines
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Max tokens per draft
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    // @field: Timeout seconds for a single draft call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: GenerationProvider) -> Self {
        match provider_type {
            GenerationProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_tokens: default_max_tokens(),
                timeout_secs: default_timeout_secs(),
            },
            GenerationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                concurrent_requests: default_concurrent_requests(),
                max_tokens: default_max_tokens(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// Generation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Generation provider to use
    #[serde(default)]
    pub provider: GenerationProvider,

    /// Available generation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common generation settings
    #[serde(default)]
    pub common: GenerationCommonConfig,
}

/// Common generation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationCommonConfig {
    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retry count for failed provider requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Deadline for the draft stage, in seconds
    #[serde(default = "default_draft_timeout_secs")]
    pub draft_timeout_secs: u64,

    /// Deadline for the review stage, in seconds
    #[serde(default = "default_review_timeout_secs")]
    pub review_timeout_secs: u64,
}

impl Default for GenerationCommonConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            draft_timeout_secs: default_draft_timeout_secs(),
            review_timeout_secs: default_review_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_output_dir() -> String {
    "projects/".to_string()
}

fn default_topic_tag() -> String {
    "portfolio".to_string()
}

fn default_commits_lookback_days() -> i64 {
    30
}

fn default_readme_excerpt_length() -> usize {
    500
}

fn default_max_commits() -> usize {
    10
}

fn default_max_releases() -> usize {
    3
}

fn default_max_languages() -> usize {
    5
}

fn default_new_release_weight() -> i32 {
    100
}

fn default_readme_changed_weight() -> i32 {
    40
}

fn default_feat_commit_weight() -> i32 {
    30
}

fn default_refactor_commit_weight() -> i32 {
    30
}

fn default_fix_commit_weight() -> i32 {
    15
}

fn default_no_commits_weight() -> i32 {
    -999
}

fn default_update_threshold() -> i32 {
    50
}

fn default_tone() -> String {
    "neutral, factual".to_string()
}

fn default_max_summary_length() -> usize {
    600
}

fn default_forbidden_words() -> Vec<String> {
    [
        "revolutionary",
        "groundbreaking",
        "blazingly",
        "world-class",
        "cutting-edge",
        "best-in-class",
        "game-changing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_required_sections() -> Vec<String> {
    ["summary", "changelog", "status-badge"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_quiet_change_threshold() -> u8 {
    15
}

fn default_summary_boundary_margin() -> u8 {
    10
}

fn default_high_risk_threshold() -> u8 {
    30
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_anthropic_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_draft_timeout_secs() -> u64 {
    180
}

fn default_review_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Target repo must be owner/name
        if self.target.repo.split('/').filter(|p| !p.is_empty()).count() != 2 {
            return Err(anyhow!(
                "target.repo must be in 'owner/name' form, got '{}'",
                self.target.repo
            ));
        }

        // Policy bounds
        if self.policy.max_summary_length == 0 {
            return Err(anyhow!("policy.max_summary_length must be greater than zero"));
        }

        if self.scoring.update_threshold <= 0 {
            return Err(anyhow!("scoring.update_threshold must be positive"));
        }

        // Validate API key for providers that need one
        if self.generation.provider == GenerationProvider::Anthropic {
            let api_key = self.generation.get_api_key();
            if api_key.is_empty() && std::env::var("ANTHROPIC_API_KEY").is_err() {
                return Err(anyhow!(
                    "Generation API key is required for Anthropic provider"
                ));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target: TargetConfig::default(),
            discovery: DiscoveryConfig::default(),
            collector: CollectorConfig::default(),
            scoring: ScoringConfig::default(),
            policy: PolicyConfig::default(),
            review: ReviewConfig::default(),
            workflow: WorkflowConfig::default(),
            generation: GenerationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl GenerationConfig {
    pub fn optimal_concurrent_requests(&self) -> usize {
        // Check if the provider exists in the available_providers
        if let Some(provider_config) = self.get_active_provider_config() {
            return provider_config.concurrent_requests;
        }

        // Default fallback
        default_concurrent_requests()
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            GenerationProvider::Ollama => default_ollama_model(),
            GenerationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Fall back to the environment for the Anthropic key
        if self.provider == GenerationProvider::Anthropic {
            if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
                return key;
            }
        }

        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            GenerationProvider::Ollama => default_ollama_endpoint(),
            GenerationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the max tokens for the active provider
    pub fn get_max_tokens(&self) -> u32 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.max_tokens > 0 {
                return provider_config.max_tokens;
            }
        }

        // Default fallback
        default_max_tokens()
    }

    /// Get the per-call timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        match self.provider {
            GenerationProvider::Ollama => default_timeout_secs(),
            GenerationProvider::Anthropic => default_anthropic_timeout_secs(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: GenerationProvider::default(),
            available_providers: Vec::new(),
            common: GenerationCommonConfig::default(),
        };

        // Add default providers
        config
            .available_providers
            .push(ProviderConfig::new(GenerationProvider::Ollama));
        config
            .available_providers
            .push(ProviderConfig::new(GenerationProvider::Anthropic));

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            target: TargetConfig {
                repo: "octocat/bio-site".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_withValidConfig_shouldPass() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_withBadRepoFormat_shouldFail() {
        let mut config = valid_config();
        config.target.repo = "just-a-name".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_withZeroSummaryLength_shouldFail() {
        let mut config = valid_config();
        config.policy.max_summary_length = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generationConfig_getModel_shouldUseActiveProvider() {
        let config = GenerationConfig::default();
        assert_eq!(config.get_model(), default_ollama_model());

        let mut anthropic = GenerationConfig::default();
        anthropic.provider = GenerationProvider::Anthropic;
        assert_eq!(anthropic.get_model(), default_anthropic_model());
    }

    #[test]
    fn test_generationConfig_getEndpoint_shouldFallBackToDefaults() {
        let mut config = GenerationConfig::default();
        config.available_providers.clear();

        assert_eq!(config.get_endpoint(), default_ollama_endpoint());
    }

    #[test]
    fn test_providerFromStr_shouldParseKnownProviders() {
        assert_eq!(
            "anthropic".parse::<GenerationProvider>().unwrap(),
            GenerationProvider::Anthropic
        );
        assert_eq!(
            "Ollama".parse::<GenerationProvider>().unwrap(),
            GenerationProvider::Ollama
        );
        assert!("grok".parse::<GenerationProvider>().is_err());
    }

    #[test]
    fn test_defaultPolicy_shouldCarryForbiddenWords() {
        let policy = PolicyConfig::default();

        assert!(policy.forbidden_words.iter().any(|w| w == "revolutionary"));
        assert!(policy.max_summary_length > 0);
        assert!(policy.required_sections.iter().any(|s| s == "summary"));
    }

    #[test]
    fn test_configRoundTrip_shouldSerializeAndDeserialize() {
        let config = valid_config();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.target.repo, "octocat/bio-site");
        assert_eq!(parsed.policy.max_summary_length, config.policy.max_summary_length);
    }
}
