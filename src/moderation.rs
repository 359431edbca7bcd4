use crate::config::ModerationConfig;
use crate::spam::SpamScorer;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "Pending",
            CommentStatus::Approved => "Approved",
            CommentStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModerationError {
    #[error("Comment cannot be empty")]
    EmptyComment,
    #[error("comment is already {} and can no longer be moderated", .0.label().to_lowercase())]
    InvalidTransition(CommentStatus),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub post_id: String,
    pub author_name: String,
    pub content: String,
    pub status: CommentStatus,
    pub spam_score: f64,
}

impl Comment {
    pub fn is_flagged(&self, threshold: f64) -> bool {
        self.spam_score > threshold
    }

    pub fn approve(&mut self) -> Result<(), ModerationError> {
        self.transition(CommentStatus::Approved)
    }

    pub fn reject(&mut self) -> Result<(), ModerationError> {
        self.transition(CommentStatus::Rejected)
    }

    fn transition(&mut self, next: CommentStatus) -> Result<(), ModerationError> {
        if self.status != CommentStatus::Pending {
            return Err(ModerationError::InvalidTransition(self.status));
        }
        log::debug!(
            "Comment {} on post {} moved from {} to {}",
            self.id,
            self.post_id,
            self.status.label(),
            next.label()
        );
        self.status = next;
        Ok(())
    }
}

/// Scores incoming comments and queues them for review.
pub struct Moderator {
    scorer: SpamScorer,
    flag_threshold: f64,
    next_id: AtomicU64,
}

impl Default for Moderator {
    fn default() -> Self {
        Self::new(SpamScorer::new(), &ModerationConfig::default())
    }
}

impl Moderator {
    pub fn new(scorer: SpamScorer, config: &ModerationConfig) -> Self {
        Self {
            scorer,
            flag_threshold: config.flag_threshold,
            next_id: AtomicU64::new(1),
        }
    }

    /// Every new comment starts pending, whatever its spam score. A blank author
    /// is recorded as [`ANONYMOUS_AUTHOR`].
    pub fn submit(
        &self,
        post_id: &str,
        author_name: &str,
        content: &str,
    ) -> Result<Comment, ModerationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ModerationError::EmptyComment);
        }
        let author_name = match author_name.trim() {
            "" => ANONYMOUS_AUTHOR,
            name => name,
        };

        let spam_score = self.scorer.score(content);
        if spam_score > self.flag_threshold {
            log::info!("Comment on post {post_id} flagged as possible spam ({spam_score:.2})");
        }

        Ok(Comment {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            post_id: post_id.to_string(),
            author_name: author_name.to_string(),
            content: content.to_string(),
            status: CommentStatus::Pending,
            spam_score,
        })
    }

    pub fn is_flagged(&self, comment: &Comment) -> bool {
        comment.is_flagged(self.flag_threshold)
    }
}

/// Comments the public may see.
pub fn visible_comments(comments: &[Comment]) -> Vec<&Comment> {
    comments
        .iter()
        .filter(|c| c.status == CommentStatus::Approved)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_starts_pending() {
        let moderator = Moderator::default();
        let comment = moderator.submit("post-1", "  Ada ", " Lovely write-up, thanks! ").unwrap();
        assert_eq!(comment.status, CommentStatus::Pending);
        assert_eq!(comment.author_name, "Ada");
        assert_eq!(comment.content, "Lovely write-up, thanks!");
        assert_eq!(comment.spam_score, 0.0);
        assert!(!moderator.is_flagged(&comment));
    }

    #[test]
    fn test_empty_comment_is_refused() {
        let moderator = Moderator::default();
        assert_eq!(
            moderator.submit("post-1", "Ada", "").unwrap_err(),
            ModerationError::EmptyComment
        );
        let err = moderator.submit("post-1", "   ", " \n\t ").unwrap_err();
        assert_eq!(err, ModerationError::EmptyComment);
        assert_eq!(err.to_string(), "Comment cannot be empty");
    }

    #[test]
    fn test_blank_author_becomes_anonymous() {
        let moderator = Moderator::default();
        let comment = moderator.submit("post-1", "  ", "Nice post").unwrap();
        assert_eq!(comment.author_name, ANONYMOUS_AUTHOR);
        assert_eq!(comment.content, "Nice post");
    }

    #[test]
    fn test_comment_ids_are_unique() {
        let moderator = Moderator::default();
        let first = moderator.submit("p", "a", "one").unwrap();
        let second = moderator.submit("p", "a", "two").unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_spammy_comment_is_flagged_but_pending() {
        let moderator = Moderator::default();
        let comment = moderator
            .submit(
                "post-1",
                "bot",
                "WINNER!!! Click here to earn money, $5k guaranteed results, limited time",
            )
            .unwrap();
        assert_eq!(comment.status, CommentStatus::Pending);
        assert!(comment.spam_score > 0.5);
        assert!(moderator.is_flagged(&comment));
    }

    #[test]
    fn test_flag_threshold_is_exclusive() {
        let mut comment = Moderator::default().submit("p", "a", "fine").unwrap();
        comment.spam_score = 0.5;
        assert!(!comment.is_flagged(0.5));
        comment.spam_score = 0.51;
        assert!(comment.is_flagged(0.5));
    }

    #[test]
    fn test_transitions_only_from_pending() {
        let moderator = Moderator::default();
        let mut comment = moderator.submit("p", "a", "hello").unwrap();
        comment.approve().unwrap();
        assert_eq!(comment.status, CommentStatus::Approved);

        let err = comment.reject().unwrap_err();
        assert_eq!(err, ModerationError::InvalidTransition(CommentStatus::Approved));
        assert_eq!(
            err.to_string(),
            "comment is already approved and can no longer be moderated"
        );

        let mut other = moderator.submit("p", "b", "hi").unwrap();
        other.reject().unwrap();
        assert!(other.approve().is_err());
    }

    #[test]
    fn test_visible_comments_only_approved() {
        let moderator = Moderator::default();
        let mut approved = moderator.submit("p", "a", "first").unwrap();
        approved.approve().unwrap();
        let pending = moderator.submit("p", "b", "second").unwrap();
        let mut rejected = moderator.submit("p", "c", "third").unwrap();
        rejected.reject().unwrap();

        let comments = vec![approved, pending, rejected];
        let visible = visible_comments(&comments);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].content, "first");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CommentStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(CommentStatus::Pending.label(), "Pending");
    }
}
