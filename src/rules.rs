//! Penalty tables shared by the editorial scorers.
//!
//! A table is a slice of [`Rule`]s evaluated against one input. Every violated
//! rule subtracts its weight from a starting score and appends its message to
//! the feedback, in table order. Scores never drop below zero.

use serde::{Deserialize, Serialize};

pub const PERFECT_SCORE: i32 = 100;

pub struct Rule<I: ?Sized> {
    pub name: &'static str,
    pub weight: i32,
    pub message: &'static str,
    pub violated: fn(&I) -> bool,
}

impl<I: ?Sized> Rule<I> {
    pub fn applies_to(&self, input: &I) -> bool {
        (self.violated)(input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub score: i32,
    pub feedback: Vec<String>,
}

pub fn evaluate<I: ?Sized>(rules: &[Rule<I>], input: &I) -> RuleOutcome {
    let mut score = PERFECT_SCORE;
    let mut feedback = Vec::new();

    for rule in rules {
        if rule.applies_to(input) {
            log::debug!("Rule '{}' violated (-{})", rule.name, rule.weight);
            score -= rule.weight;
            feedback.push(rule.message.to_string());
        }
    }

    RuleOutcome {
        score: score.max(0),
        feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_empty(text: &str) -> bool {
        text.is_empty()
    }

    fn has_no_digits(text: &str) -> bool {
        !text.chars().any(|c| c.is_ascii_digit())
    }

    const RULES: &[Rule<str>] = &[
        Rule {
            name: "empty",
            weight: 60,
            message: "Text is empty",
            violated: is_empty,
        },
        Rule {
            name: "no-digits",
            weight: 60,
            message: "Text has no digits",
            violated: has_no_digits,
        },
    ];

    #[test]
    fn test_clean_input_keeps_perfect_score() {
        let outcome = evaluate(RULES, "abc123");
        assert_eq!(outcome.score, PERFECT_SCORE);
        assert!(outcome.feedback.is_empty());
    }

    #[test]
    fn test_penalties_accumulate_in_table_order_and_floor_at_zero() {
        let outcome = evaluate(RULES, "");
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.feedback, vec!["Text is empty", "Text has no digits"]);
    }
}
