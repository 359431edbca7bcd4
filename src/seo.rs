//! Editorial SEO scoring for a post's title, meta description and Markdown body.
//!
//! Each field is scored independently against a fixed penalty table (see
//! [`TITLE_RULES`], [`DESCRIPTION_RULES`] and [`CONTENT_RULES`]). An empty
//! feedback list means the field needs no changes.

use crate::rules::{self, Rule, RuleOutcome};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MIN_TITLE_LENGTH: usize = 30;
const MAX_TITLE_LENGTH: usize = 60;
const MIN_DESCRIPTION_LENGTH: usize = 120;
const MAX_DESCRIPTION_LENGTH: usize = 160;
const MIN_WORD_COUNT: usize = 300;
const MIN_HEADINGS: usize = 2;
const MIN_LINKS: usize = 1;
/// Words of this many characters or fewer never count as keywords.
const KEYWORD_MIN_LENGTH: usize = 3;
const KEYWORD_FLOOR_PERCENT: f64 = 1.0;
const KEYWORD_STUFFING_PERCENT: f64 = 5.0;
const TOP_KEYWORDS: usize = 5;

lazy_static! {
    static ref MARKDOWN_LINK: Regex = Regex::new(r"\[.*?\]\(.*?\)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldScore {
    pub length: usize,
    pub score: i32,
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordDensity {
    pub keyword: String,
    /// Percentage of the total word count.
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStats {
    pub word_count: usize,
    pub keyword_density: Vec<KeywordDensity>,
    pub headings: usize,
    pub links: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentScore {
    pub stats: ContentStats,
    pub score: i32,
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoAnalysis {
    pub title: FieldScore,
    pub description: FieldScore,
    pub content: ContentScore,
}

impl SeoAnalysis {
    pub fn is_clean(&self) -> bool {
        self.title.feedback.is_empty()
            && self.description.feedback.is_empty()
            && self.content.feedback.is_empty()
    }
}

fn title_too_short(title: &str) -> bool {
    title.chars().count() < MIN_TITLE_LENGTH
}

fn title_too_long(title: &str) -> bool {
    title.chars().count() > MAX_TITLE_LENGTH
}

fn title_not_capitalized(title: &str) -> bool {
    !title.starts_with(|c: char| c.is_ascii_uppercase())
}

fn description_too_short(description: &str) -> bool {
    description.chars().count() < MIN_DESCRIPTION_LENGTH
}

fn description_too_long(description: &str) -> bool {
    description.chars().count() > MAX_DESCRIPTION_LENGTH
}

fn description_missing_period(description: &str) -> bool {
    !description.trim().ends_with('.')
}

fn content_too_short(stats: &ContentStats) -> bool {
    stats.word_count < MIN_WORD_COUNT
}

fn content_few_headings(stats: &ContentStats) -> bool {
    stats.headings < MIN_HEADINGS
}

fn content_no_links(stats: &ContentStats) -> bool {
    stats.links < MIN_LINKS
}

fn content_keyword_stuffing(stats: &ContentStats) -> bool {
    stats
        .keyword_density
        .iter()
        .any(|k| k.density > KEYWORD_STUFFING_PERCENT)
}

pub const TITLE_RULES: &[Rule<str>] = &[
    Rule {
        name: "title-too-short",
        weight: 20,
        message: "Title is too short (recommended: 30-60 characters)",
        violated: title_too_short,
    },
    Rule {
        name: "title-too-long",
        weight: 20,
        message: "Title is too long (recommended: 30-60 characters)",
        violated: title_too_long,
    },
    Rule {
        name: "title-capitalization",
        weight: 10,
        message: "Title should start with a capital letter",
        violated: title_not_capitalized,
    },
];

pub const DESCRIPTION_RULES: &[Rule<str>] = &[
    Rule {
        name: "description-too-short",
        weight: 20,
        message: "Description is too short (recommended: 120-160 characters)",
        violated: description_too_short,
    },
    Rule {
        name: "description-too-long",
        weight: 20,
        message: "Description is too long (recommended: 120-160 characters)",
        violated: description_too_long,
    },
    Rule {
        name: "description-period",
        weight: 10,
        message: "Description should end with a period",
        violated: description_missing_period,
    },
];

pub const CONTENT_RULES: &[Rule<ContentStats>] = &[
    Rule {
        name: "content-too-short",
        weight: 20,
        message: "Content is too short (recommended: at least 300 words)",
        violated: content_too_short,
    },
    Rule {
        name: "content-headings",
        weight: 15,
        message: "Add more headings to structure your content",
        violated: content_few_headings,
    },
    Rule {
        name: "content-links",
        weight: 15,
        message: "Add some internal or external links",
        violated: content_no_links,
    },
    Rule {
        name: "content-keyword-stuffing",
        weight: 20,
        message: "Some keywords appear too frequently (keyword stuffing)",
        violated: content_keyword_stuffing,
    },
];

pub fn analyze(title: &str, description: &str, content: &str) -> SeoAnalysis {
    SeoAnalysis {
        title: score_field(TITLE_RULES, title),
        description: score_field(DESCRIPTION_RULES, description),
        content: score_content(content),
    }
}

fn score_field(rules: &[Rule<str>], text: &str) -> FieldScore {
    let RuleOutcome { score, feedback } = rules::evaluate(rules, text);
    FieldScore {
        length: text.chars().count(),
        score,
        feedback,
    }
}

fn score_content(content: &str) -> ContentScore {
    let stats = content_stats(content);
    let RuleOutcome { score, feedback } = rules::evaluate(CONTENT_RULES, &stats);
    ContentScore {
        stats,
        score,
        feedback,
    }
}

pub fn content_stats(content: &str) -> ContentStats {
    let lowered = content.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    ContentStats {
        word_count: words.len(),
        keyword_density: keyword_density(&words),
        headings: content.matches('#').count(),
        links: MARKDOWN_LINK.find_iter(content).count(),
    }
}

/// Top keywords by share of `words`. Entries under the floor are dropped and ties
/// keep the order in which the words first appear.
pub fn keyword_density(words: &[&str]) -> Vec<KeywordDensity> {
    if words.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &word in words {
        if word.chars().count() > KEYWORD_MIN_LENGTH {
            let count = counts.entry(word).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }
    }

    let total = words.len() as f64;
    let mut densities: Vec<KeywordDensity> = order
        .into_iter()
        .map(|word| KeywordDensity {
            keyword: word.to_string(),
            density: counts[word] as f64 / total * 100.0,
        })
        .filter(|k| k.density >= KEYWORD_FLOOR_PERCENT)
        .collect();

    // Stable sort keeps first-appearance order among equal densities.
    densities.sort_by(|a, b| b.density.total_cmp(&a.density));
    densities.truncate(TOP_KEYWORDS);
    densities
}
