//! Experiment configuration.
//!
//! Defaults encode the canonical probability model; a JSON file can
//! override any section. In tests, use ExperimentConfig::default().

use serde::{Deserialize, Serialize};

/// Base rates, bonuses and ceilings for the funnel probability model.
/// Base rates are conditional: each applies only when the prior stage
/// succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelRatesConfig {
    pub base_open:    f64,
    pub base_reply:   f64,
    pub base_meeting: f64,
    /// Added once per trigger mentioned verbatim in the message body.
    pub trigger_mention_bonus: f64,
    /// Fraction of the trigger bonus that feeds the open probability.
    pub trigger_open_weight: f64,
    /// Fraction of the variant bonus that feeds the meeting probability.
    pub variant_meeting_weight: f64,
    pub open_ceiling:    f64,
    pub reply_ceiling:   f64,
    pub meeting_ceiling: f64,
}

impl Default for FunnelRatesConfig {
    fn default() -> Self {
        Self {
            base_open:             0.40,
            base_reply:            0.05,
            base_meeting:          0.015,
            trigger_mention_bonus: 0.15,
            trigger_open_weight:   0.5,
            variant_meeting_weight: 0.5,
            open_ceiling:          0.90,
            reply_ceiling:         0.40,
            meeting_ceiling:       0.20,
        }
    }
}

/// One persona-fit rule: a title keyword paired with a hypothesis
/// description keyword. Rules are evaluated in order and the first
/// match wins — they are exclusive, never additive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitRule {
    pub title_keyword:       String,
    pub description_keyword: String,
    pub bonus:               f64,
}

impl FitRule {
    fn new(title_keyword: &str, description_keyword: &str, bonus: f64) -> Self {
        Self {
            title_keyword:       title_keyword.to_string(),
            description_keyword: description_keyword.to_string(),
            bonus,
        }
    }
}

/// Settings for the optional text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub api_url:    String,
    pub model:      String,
    pub max_tokens: u32,
    /// Per-call deadline. Every generation call is latency-bearing and
    /// fallible; the pipeline never waits longer than this.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url:      "https://api.anthropic.com/v1/messages".to_string(),
            model:        "claude-3-5-sonnet-20240620".to_string(),
            max_tokens:   1024,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub funnel: FunnelRatesConfig,
    #[serde(default = "default_fit_rules")]
    pub fit_rules: Vec<FitRule>,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            funnel:     FunnelRatesConfig::default(),
            fit_rules:  default_fit_rules(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Known persona/angle pairings. Order matters: first match wins.
fn default_fit_rules() -> Vec<FitRule> {
    vec![
        FitRule::new("sales", "roi", 0.10),
        FitRule::new("founder", "social proof", 0.10),
        FitRule::new("engineer", "technical", 0.15),
    ]
}

impl ExperimentConfig {
    /// Load overrides from a JSON file. Missing sections keep their
    /// defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ExperimentConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}
