pub mod loader;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub spam: SpamConfig,
    pub images: ImageConfig,
    pub moderation: ModerationConfig,
}

/// Weighted pattern tiers plus the two flat penalties of the spam scorer.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpamConfig {
    pub tiers: Vec<PatternTier>,
    pub caps_ratio_threshold: f64,
    pub caps_penalty: f64,
    /// Minimum length of a run of one repeated character.
    pub repeat_run_length: usize,
    pub repeat_penalty: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PatternTier {
    pub name: String,
    /// Added to the score once per counted match.
    pub weight: f64,
    pub patterns: Vec<PatternRule>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PatternRule {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub count: MatchCount,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchCount {
    /// At most one match contributes.
    #[default]
    First,
    /// Every non-overlapping match contributes.
    All,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ImageConfig {
    pub max_dimension: u32,
    pub max_file_size: u64,
    pub lossy_quality: f32,
    pub lossless_quality: f32,
    /// Forces every output into one MIME type instead of picking by transparency.
    pub output_format: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModerationConfig {
    /// Comments scoring above this are flagged as possible spam.
    pub flag_threshold: f64,
}

impl PatternRule {
    fn new(name: &str, pattern: &str, case_insensitive: bool, count: MatchCount) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            case_insensitive,
            count,
        }
    }
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                PatternTier {
                    name: "spam".to_string(),
                    weight: 0.3,
                    patterns: vec![
                        PatternRule::new(
                            "promotional keywords",
                            r"\b(viagra|cialis|casino|poker|lottery|prize|winner|buy now|click here|free offer)\b",
                            true,
                            MatchCount::First,
                        ),
                        PatternRule::new(
                            "money schemes",
                            r"\b(earn money|make money|work from home|get rich|income opportunity)\b",
                            true,
                            MatchCount::First,
                        ),
                        PatternRule::new(
                            "health claims",
                            r"\b(enlargement|weight loss|diet pill|miracle cure|amazing results)\b",
                            true,
                            MatchCount::First,
                        ),
                        PatternRule::new(
                            "chained links",
                            r"(https?://[^\s]+){3,}",
                            false,
                            MatchCount::All,
                        ),
                        PatternRule::new(
                            "dollar amounts",
                            r"\$\d+[kK]",
                            false,
                            MatchCount::All,
                        ),
                        PatternRule::new(
                            "shouting",
                            r"[A-Z\s]{20,}",
                            false,
                            MatchCount::All,
                        ),
                    ],
                },
                PatternTier {
                    name: "suspicious".to_string(),
                    weight: 0.15,
                    patterns: vec![
                        PatternRule::new(
                            "urgency",
                            r"\b(limited time|act now|don't wait|hurry|special offer)\b",
                            true,
                            MatchCount::First,
                        ),
                        PatternRule::new(
                            "repeated punctuation",
                            r"[!?]{2,}",
                            false,
                            MatchCount::All,
                        ),
                        PatternRule::new(
                            "testimonial language",
                            r"\b(guarantee|proven|results|testimonial)\b",
                            true,
                            MatchCount::First,
                        ),
                        PatternRule::new(
                            "paired links",
                            r"(https?://[^\s]+){2}",
                            false,
                            MatchCount::All,
                        ),
                    ],
                },
            ],
            caps_ratio_threshold: 0.3,
            caps_penalty: 0.2,
            repeat_run_length: 5,
            repeat_penalty: 0.2,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            max_file_size: 10 * 1024 * 1024,
            lossy_quality: 0.8,
            lossless_quality: 0.9,
            output_format: None,
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            flag_threshold: 0.5,
        }
    }
}
