use super::spam::SpamRules;
use super::{finalize, FilterOutcome};
use crate::types::RawComment;
use tracing::debug;

pub const DEFAULT_MAX_COMMENTS: usize = 150;

const MIN_VALID_LENGTH: usize = 10;
const MIN_SHORT_LENGTH: usize = 20;
const MIN_SUBSTANCE_LENGTH: usize = 50;
const HIGH_LIKES_FLOOR: i64 = 5;
const LIKES_FLOOR: i64 = 1;
const REPLIES_FLOOR: u32 = 2;

/// Thresholds derived from one video's valid comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YouTubeThresholds {
    pub likes: i64,
    pub high_likes: i64,
    pub replies: u32,
}

impl YouTubeThresholds {
    fn from_valid(valid: &[&RawComment]) -> Self {
        let mut likes: Vec<i64> = valid.iter().map(|c| c.score).collect();
        likes.sort_unstable();
        let median_likes = likes[likes.len() / 2];
        let p75_index = (likes.len() * 3 / 4).min(likes.len() - 1);
        let p75_likes = likes[p75_index];

        let mut replies: Vec<u32> = valid
            .iter()
            .filter(|c| !c.is_reply)
            .map(|c| c.reply_count)
            .collect();
        replies.sort_unstable();
        let median_replies = replies.get(replies.len() / 2).copied().unwrap_or(0);

        Self {
            likes: median_likes.div_euclid(2).max(LIKES_FLOOR),
            high_likes: p75_likes.max(HIGH_LIKES_FLOOR),
            // ceil(1.5 * median)
            replies: ((3 * median_replies + 1) / 2).max(REPLIES_FLOOR),
        }
    }

    /// Dual-path acceptance: long comments need ordinary support, short
    /// ones need a conversation or unusual support. Replies with unusual
    /// support are kept for context.
    fn accepts(&self, comment: &RawComment) -> bool {
        let len = comment.body_len();
        let substance = len >= MIN_SUBSTANCE_LENGTH && comment.score >= self.likes;
        let engagement = (MIN_SHORT_LENGTH..MIN_SUBSTANCE_LENGTH).contains(&len)
            && (comment.reply_count >= self.replies || comment.score >= self.high_likes);
        let notable_reply = comment.is_reply && comment.score >= self.high_likes;
        substance || engagement || notable_reply
    }
}

#[derive(Debug, Clone)]
pub struct YouTubeCommentFilter {
    max_comments: usize,
    spam_rules: SpamRules,
}

impl Default for YouTubeCommentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMMENTS)
    }
}

impl YouTubeCommentFilter {
    pub fn new(max_comments: usize) -> Self {
        Self {
            max_comments,
            spam_rules: SpamRules::default(),
        }
    }

    pub fn with_spam_rules(mut self, spam_rules: SpamRules) -> Self {
        self.spam_rules = spam_rules;
        self
    }

    pub fn max_comments(&self) -> usize {
        self.max_comments
    }

    pub fn is_valid(&self, comment: &RawComment) -> bool {
        let text = comment.body.trim();
        !text.is_empty()
            && text.chars().count() >= MIN_VALID_LENGTH
            && !self.spam_rules.is_spam(text)
    }

    /// Thresholds for a comment set, or `None` when nothing is valid.
    pub fn thresholds(&self, comments: &[RawComment]) -> Option<YouTubeThresholds> {
        let valid: Vec<&RawComment> = comments.iter().filter(|c| self.is_valid(c)).collect();
        if valid.is_empty() {
            None
        } else {
            Some(YouTubeThresholds::from_valid(&valid))
        }
    }

    pub fn filter(&self, comments: &[RawComment]) -> FilterOutcome {
        let valid: Vec<&RawComment> = comments.iter().filter(|c| self.is_valid(c)).collect();
        if valid.is_empty() {
            debug!("No valid YouTube comments out of {}", comments.len());
            return FilterOutcome::empty(comments.len());
        }

        let thresholds = YouTubeThresholds::from_valid(&valid);
        debug!(
            "YouTube thresholds likes={} high_likes={} replies={} over {} valid comments",
            thresholds.likes,
            thresholds.high_likes,
            thresholds.replies,
            valid.len()
        );

        let kept: Vec<RawComment> = valid
            .iter()
            .filter(|c| thresholds.accepts(c))
            .map(|c| (*c).clone())
            .collect();

        finalize(kept, comments.len(), valid.len(), self.max_comments)
    }
}
