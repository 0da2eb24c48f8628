use super::{finalize, FilterOutcome};
use crate::types::RawComment;
use tracing::debug;

pub const DEFAULT_MAX_COMMENTS: usize = 50;

const MIN_VALID_LENGTH: usize = 10;
const MIN_SUBSTANCE_LENGTH: usize = 50;
const SCORE_FLOOR: i64 = 3;
const MODERATION_BOT: &str = "automoderator";

#[derive(Debug, Clone)]
pub struct RedditCommentFilter {
    max_comments: usize,
}

impl Default for RedditCommentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMMENTS)
    }
}

impl RedditCommentFilter {
    pub fn new(max_comments: usize) -> Self {
        Self { max_comments }
    }

    pub fn max_comments(&self) -> usize {
        self.max_comments
    }

    pub fn filter(&self, comments: &[RawComment]) -> FilterOutcome {
        let valid: Vec<&RawComment> = comments.iter().filter(|c| is_valid(c)).collect();
        if valid.is_empty() {
            debug!("No valid Reddit comments out of {}", comments.len());
            return FilterOutcome::empty(comments.len());
        }

        let threshold = score_threshold(&valid);
        debug!(
            "Reddit comment threshold {} over {} valid comments",
            threshold,
            valid.len()
        );

        let kept: Vec<RawComment> = valid
            .iter()
            .filter(|c| {
                c.score >= threshold
                    && c.body_len() >= MIN_SUBSTANCE_LENGTH
                    && !c.author.to_lowercase().contains(MODERATION_BOT)
            })
            .map(|c| (*c).clone())
            .collect();

        finalize(kept, comments.len(), valid.len(), self.max_comments)
    }
}

fn is_valid(comment: &RawComment) -> bool {
    let body = comment.body.as_str();
    if body.is_empty() || body == "[deleted]" || body == "[removed]" {
        return false;
    }
    if comment.author.is_empty() || comment.author == "[deleted]" {
        return false;
    }
    body.trim().chars().count() > MIN_VALID_LENGTH
}

/// Half the median score, but never below the floor.
fn score_threshold(valid: &[&RawComment]) -> i64 {
    let mut scores: Vec<i64> = valid.iter().map(|c| c.score).collect();
    scores.sort_unstable_by(|a, b| b.cmp(a));
    let median = scores[scores.len() / 2];
    median.div_euclid(2).max(SCORE_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{body_of, comment};

    #[test]
    fn test_all_invalid_comments_yield_empty_result() {
        let comments = vec![
            comment("1", "[deleted]", &body_of(80), 50),
            comment("2", "alice", "[removed]", 50),
            comment("3", "bob", "", 50),
            comment("4", "carol", "too short", 50),
            comment("5", "", &body_of(80), 50),
        ];

        let outcome = RedditCommentFilter::default().filter(&comments);
        assert!(outcome.valuable_comments.is_empty());
        assert_eq!(outcome.extraction_stats.total, 5);
        assert_eq!(outcome.extraction_stats.valid, 0);
        assert_eq!(outcome.extraction_stats.percentage_kept, 0);
        assert_eq!(outcome.extraction_stats.average_score, 0);
    }

    #[test]
    fn test_empty_input() {
        let outcome = RedditCommentFilter::default().filter(&[]);
        assert!(outcome.valuable_comments.is_empty());
        assert_eq!(outcome.extraction_stats.total, 0);
    }

    #[test]
    fn test_median_threshold_scenario() {
        // 40 invalid comments plus 60 valid ones whose median score is 10.
        let mut comments = Vec::new();
        for i in 0..20 {
            comments.push(comment(&format!("del{i}"), "[deleted]", &body_of(80), 100));
            comments.push(comment(&format!("short{i}"), "user", "meh", 100));
        }
        for i in 0..60 {
            // 30 scores in 20..=49, then ten each of 10, 9 and 8.
            let score = if i < 30 { 20 + i as i64 } else { 10 - (i as i64 - 30) / 10 };
            let body = if i % 2 == 0 { body_of(60) } else { body_of(30) };
            comments.push(comment(&format!("v{i}"), &format!("user{i}"), &body, score));
        }

        let filter = RedditCommentFilter::default();
        let valid: Vec<&RawComment> = comments.iter().filter(|c| is_valid(c)).collect();
        assert_eq!(valid.len(), 60);
        assert_eq!(score_threshold(&valid), 5);

        let outcome = filter.filter(&comments);
        assert_eq!(outcome.extraction_stats.total, 100);
        assert_eq!(outcome.extraction_stats.valid, 60);
        assert!(outcome.valuable_comments.len() <= DEFAULT_MAX_COMMENTS);
        for c in &outcome.valuable_comments {
            assert!(c.score >= 5);
            assert!(c.body_len() >= 50);
        }
        assert!(outcome
            .valuable_comments
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        // Only even-indexed (long) comments qualify, and all 30 score at least 8.
        assert_eq!(outcome.valuable_comments.len(), 30);
        assert_eq!(outcome.extraction_stats.percentage_kept, 50);
    }

    #[test]
    fn test_score_floor_applies_on_quiet_posts() {
        let comments = vec![
            comment("1", "a", &body_of(60), 0),
            comment("2", "b", &body_of(60), 1),
            comment("3", "c", &body_of(60), 2),
            comment("4", "d", &body_of(60), 3),
        ];
        let outcome = RedditCommentFilter::default().filter(&comments);
        assert_eq!(outcome.valuable_comments.len(), 1);
        assert_eq!(outcome.valuable_comments[0].id, "4");
    }

    #[test]
    fn test_automoderator_excluded_case_insensitively() {
        let comments = vec![
            comment("1", "AutoModerator", &body_of(60), 500),
            comment("2", "r_automoderator_bot", &body_of(60), 400),
            comment("3", "human", &body_of(60), 300),
        ];
        let outcome = RedditCommentFilter::default().filter(&comments);
        assert_eq!(outcome.valuable_comments.len(), 1);
        assert_eq!(outcome.valuable_comments[0].author, "human");
    }

    #[test]
    fn test_output_capped() {
        let comments: Vec<_> = (0..500)
            .map(|i| comment(&i.to_string(), "user", &body_of(120), 100))
            .collect();
        let outcome = RedditCommentFilter::default().filter(&comments);
        assert_eq!(outcome.valuable_comments.len(), DEFAULT_MAX_COMMENTS);
        assert_eq!(outcome.extraction_stats.percentage_kept, 10);

        let outcome = RedditCommentFilter::new(5).filter(&comments);
        assert_eq!(outcome.valuable_comments.len(), 5);
    }

    #[test]
    fn test_filtering_is_deterministic() {
        let comments: Vec<_> = (0..80)
            .map(|i| comment(&i.to_string(), "user", &body_of(40 + i % 30), (i % 17) as i64))
            .collect();
        let filter = RedditCommentFilter::default();
        assert_eq!(filter.filter(&comments), filter.filter(&comments));
    }

    #[test]
    fn test_raising_scores_never_keeps_fewer() {
        let comments: Vec<_> = (0..120)
            .map(|i| comment(&i.to_string(), "user", &body_of(45 + i % 20), (i * 7 % 23) as i64))
            .collect();
        let filter = RedditCommentFilter::new(1000);
        let baseline = filter.filter(&comments).valuable_comments.len();

        for bump in [1, 5, 50, 1000] {
            let raised: Vec<_> = comments
                .iter()
                .cloned()
                .map(|mut c| {
                    c.score += bump;
                    c
                })
                .collect();
            assert!(filter.filter(&raised).valuable_comments.len() >= baseline);
        }
    }
}
