pub mod config;
pub mod imaging;
pub mod markdown;
pub mod moderation;
pub mod post;
pub mod rules;
pub mod seo;
pub mod spam;
pub mod text_stats;

pub use config::Config;
pub use imaging::{ImageError, ImageOptimizer, OptimizedImage, SourceImage};
pub use moderation::{Comment, CommentStatus, Moderator};
pub use seo::SeoAnalysis;
pub use spam::{SpamAnalysis, SpamScorer};
pub use text_stats::TextMetrics;

/// Spam likelihood in [0, 1] using the built-in pattern tables.
pub fn spam_score(text: &str) -> f64 {
    SpamScorer::new().score(text)
}
