//! Comment quality filters.
//!
//! Both variants reduce a raw comment set to a bounded, high-signal subset
//! ordered by score. Thresholds are relative to the comment set itself so
//! that a 20-upvote comment on a quiet post and a 2000-upvote comment on a
//! front-page thread can both qualify.

pub mod reddit;
pub mod spam;
pub mod youtube;

pub use reddit::RedditCommentFilter;
pub use spam::{SpamRule, SpamRules};
pub use youtube::{YouTubeCommentFilter, YouTubeThresholds};

use crate::types::{ExtractionStats, RawComment, ValuableComment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    pub valuable_comments: Vec<ValuableComment>,
    pub extraction_stats: ExtractionStats,
}

impl FilterOutcome {
    pub fn empty(total: usize) -> Self {
        Self {
            valuable_comments: Vec::new(),
            extraction_stats: ExtractionStats {
                total,
                ..Default::default()
            },
        }
    }
}

/// Sort by score descending (ties keep input order), truncate, and compute
/// stats. Percentages are relative to the valid comments, not the total.
pub(crate) fn finalize(
    mut kept: Vec<RawComment>,
    total: usize,
    valid: usize,
    cap: usize,
) -> FilterOutcome {
    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept.truncate(cap);

    let extracted = kept.len();
    let average_score = if extracted == 0 {
        0
    } else {
        let sum: i64 = kept.iter().map(|c| c.score).sum();
        round_half_up(sum as f64 / extracted as f64)
    };
    let percentage_kept = if valid == 0 {
        0
    } else {
        round_half_up(100.0 * extracted as f64 / valid as f64) as u32
    };

    FilterOutcome {
        valuable_comments: kept,
        extraction_stats: ExtractionStats {
            total,
            valid,
            extracted,
            percentage_kept,
            average_score,
        },
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::RawComment;

    pub fn comment(id: &str, author: &str, body: &str, score: i64) -> RawComment {
        RawComment {
            id: id.to_string(),
            author: author.to_string(),
            body: body.to_string(),
            score,
            created_at: None,
            parent_id: None,
            depth: 0,
            reply_count: 0,
            award_count: 0,
            is_reply: false,
        }
    }

    /// A body of exactly `len` characters.
    pub fn body_of(len: usize) -> String {
        "insightful ".repeat(len / 11 + 1)[..len].to_string()
    }
}
