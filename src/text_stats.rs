use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Average silent reading speed in words per minute.
pub const READING_WORDS_PER_MINUTE: f64 = 225.0;
/// Average speaking speed in words per minute.
pub const SPEAKING_WORDS_PER_MINUTE: f64 = 135.0;

lazy_static! {
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]+").unwrap();
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n\s*\n").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub reading_time: String,
    pub speaking_time: String,
}

pub fn analyze(text: &str) -> TextMetrics {
    let words = word_count(text);

    TextMetrics {
        characters: text.chars().count(),
        characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
        words,
        sentences: count_segments(&SENTENCE_BREAK, text),
        paragraphs: count_segments(&PARAGRAPH_BREAK, text),
        reading_time: format_minutes(words as f64 / READING_WORDS_PER_MINUTE),
        speaking_time: format_minutes(words as f64 / SPEAKING_WORDS_PER_MINUTE),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn count_segments(separator: &Regex, text: &str) -> usize {
    separator
        .split(text)
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

pub fn format_minutes(minutes: f64) -> String {
    if minutes < 1.0 {
        return "Less than a minute".to_string();
    }

    let rounded = minutes.round() as u64;
    format!("{} minute{}", rounded, if rounded == 1 { "" } else { "s" })
}
