use crate::text_stats::{word_count, READING_WORDS_PER_MINUTE};

const EXCERPT_LENGTH: usize = 200;

/// URL slug for a post title: lowercase ASCII letters and digits joined by dashes.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_space = false;
    for ch in kept.chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
        } else {
            slug.push(ch);
            in_space = false;
        }
    }
    slug
}

/// First 200 characters of the content, with an ellipsis when truncated.
pub fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_LENGTH).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Whole minutes needed to read the content, never less than one.
pub fn read_time_minutes(content: &str) -> u32 {
    let minutes = (word_count(content) as f64 / READING_WORDS_PER_MINUTE).round() as u32;
    minutes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Rust   2024:  What's New"), "rust-2024-whats-new");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_keeps_edge_whitespace_as_dash() {
        assert_eq!(slugify(" padded "), "-padded-");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short post"), "short post");
        let exact = "x".repeat(200);
        assert_eq!(excerpt(&exact), exact);
        let long = "y".repeat(250);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "é".repeat(201);
        assert_eq!(excerpt(&text), format!("{}...", "é".repeat(200)));
    }

    #[test]
    fn test_read_time_minutes() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(225)), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(900)), 4);
    }
}
