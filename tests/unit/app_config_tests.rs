/*!
 * Configuration loading and validation tests.
 */

use pagesmith::app_config::{
    Config, GenerationProvider, PolicyConfig, TargetConfig, WorkflowMode,
};

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
fn test_defaultConfig_shouldFailValidationWithoutTargetRepo() {
    // The only field without a usable default is the target repo
    assert!(Config::default().validate().is_err());
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_defaults_shouldMatchDocumentedValues() {
    let config = valid_config();

    assert_eq!(config.target.branch, "main");
    assert_eq!(config.target.output_dir, "projects/");
    assert_eq!(config.collector.commits_lookback_days, 30);
    assert_eq!(config.collector.readme_excerpt_length, 500);
    assert_eq!(config.scoring.update_threshold, 50);
    assert_eq!(config.policy.max_summary_length, 600);
    assert_eq!(config.workflow.mode, WorkflowMode::Manual);
    assert_eq!(config.workflow.high_risk_threshold, 30);
    assert_eq!(config.generation.provider, GenerationProvider::Ollama);
}

#[test]
fn test_partialConfigJson_shouldFillDefaults() {
    let json = r#"{
        "target": { "repo": "octocat/bio-site" },
        "generation": {}
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.target.branch, "main");
    assert_eq!(config.policy.max_summary_length, 600);
    assert!(config
        .policy
        .forbidden_words
        .iter()
        .any(|w| w == "revolutionary"));
}

#[test]
fn test_policyOverrides_shouldSurviveRoundTrip() {
    let mut config = valid_config();
    config.policy = PolicyConfig {
        tone: "enthusiastic but factual".to_string(),
        max_summary_length: 280,
        forbidden_words: vec!["synergy".to_string()],
        required_sections: vec!["summary".to_string()],
    };

    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.policy.max_summary_length, 280);
    assert_eq!(parsed.policy.forbidden_words, vec!["synergy"]);
}

#[test]
fn test_generationConfig_shouldResolveProviderSettings() {
    let mut config = valid_config();
    config.generation.provider = GenerationProvider::Anthropic;

    assert_eq!(config.generation.get_endpoint(), "https://api.anthropic.com");
    assert!(config.generation.get_model().starts_with("claude"));
    assert!(config.generation.get_max_tokens() > 0);
}

#[test]
fn test_workflowModeJson_shouldUseLowercase() {
    let config = valid_config();
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["workflow"]["mode"], "manual");
    assert_eq!(json["generation"]["provider"], "ollama");
}
