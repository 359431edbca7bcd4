use crate::config::{MatchCount, SpamConfig};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Spam likelihood of a comment together with the rules that contributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamAnalysis {
    pub score: f64,
    pub evidence: Vec<String>,
}

struct CompiledPattern {
    name: String,
    tier: String,
    weight: f64,
    regex: Regex,
    count: MatchCount,
}

impl CompiledPattern {
    fn matches(&self, text: &str) -> usize {
        match self.count {
            MatchCount::First => usize::from(self.regex.is_match(text)),
            MatchCount::All => self.regex.find_iter(text).count(),
        }
    }
}

pub struct SpamScorer {
    patterns: Vec<CompiledPattern>,
    caps_ratio_threshold: f64,
    caps_penalty: f64,
    repeat_run_length: usize,
    repeat_penalty: f64,
}

impl Default for SpamScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpamScorer {
    pub fn new() -> Self {
        Self::from_config(&SpamConfig::default()).unwrap_or_else(|e| {
            log::warn!("Built-in spam patterns failed to compile: {e}");
            Self::with_patterns(&SpamConfig::default(), Vec::new())
        })
    }

    pub fn from_config(config: &SpamConfig) -> anyhow::Result<Self> {
        let mut patterns = Vec::new();
        for tier in &config.tiers {
            for rule in &tier.patterns {
                let regex = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(rule.case_insensitive)
                    .build()
                    .map_err(|e| {
                        anyhow::anyhow!(
                            "Invalid regex pattern '{}' in spam tier '{}': {}",
                            rule.pattern,
                            tier.name,
                            e
                        )
                    })?;
                patterns.push(CompiledPattern {
                    name: rule.name.clone(),
                    tier: tier.name.clone(),
                    weight: tier.weight,
                    regex,
                    count: rule.count,
                });
            }
        }

        Ok(Self::with_patterns(config, patterns))
    }

    fn with_patterns(config: &SpamConfig, patterns: Vec<CompiledPattern>) -> Self {
        Self {
            patterns,
            caps_ratio_threshold: config.caps_ratio_threshold,
            caps_penalty: config.caps_penalty,
            repeat_run_length: config.repeat_run_length,
            repeat_penalty: config.repeat_penalty,
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn score(&self, text: &str) -> f64 {
        self.analyze(text).score
    }

    pub fn analyze(&self, text: &str) -> SpamAnalysis {
        let mut score = 0.0;
        let mut evidence = Vec::new();

        for pattern in &self.patterns {
            let matches = pattern.matches(text);
            if matches > 0 {
                score += matches as f64 * pattern.weight;
                evidence.push(format!(
                    "{} pattern '{}' matched {} time{}",
                    pattern.tier,
                    pattern.name,
                    matches,
                    if matches == 1 { "" } else { "s" }
                ));
            }
        }

        let ratio = uppercase_ratio(text);
        if ratio > self.caps_ratio_threshold {
            score += self.caps_penalty;
            evidence.push(format!(
                "Excessive capitalization ({:.1}% uppercase)",
                ratio * 100.0
            ));
        }

        if let Some(ch) = repeated_run(text, self.repeat_run_length) {
            score += self.repeat_penalty;
            evidence.push(format!(
                "Character '{}' repeated {}+ times",
                ch.escape_debug(),
                self.repeat_run_length
            ));
        }

        let score = score.clamp(0.0, 1.0);
        log::debug!("Spam score {score:.2} from {} signals", evidence.len());

        SpamAnalysis { score, evidence }
    }
}

/// Share of ASCII uppercase letters among all characters; zero for empty text.
fn uppercase_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut upper = 0usize;
    for ch in text.chars() {
        total += 1;
        if ch.is_ascii_uppercase() {
            upper += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        upper as f64 / total as f64
    }
}

/// First character repeated at least `min_run` times in a row. Line terminators
/// never form a run.
fn repeated_run(text: &str, min_run: usize) -> Option<char> {
    if min_run == 0 {
        return None;
    }

    let mut previous: Option<char> = None;
    let mut run = 0usize;
    for ch in text.chars() {
        if matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
            previous = None;
            run = 0;
            continue;
        }

        if previous == Some(ch) {
            run += 1;
        } else {
            previous = Some(ch);
            run = 1;
        }

        if run >= min_run {
            return Some(ch);
        }
    }
    None
}
