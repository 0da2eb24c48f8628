//! Pluggable spam detection for video comments.

use once_cell::sync::Lazy;
use regex::Regex;

/// A named pattern; a comment matching it is treated as spam.
#[derive(Debug, Clone)]
pub struct SpamRule {
    name: String,
    pattern: Regex,
}

impl SpamRule {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    (
        "reaction",
        r"(?i)^(nice|lol+|lmao+|wow+|cool|great|awesome|amazing|love (it|this)|(nice|great|good|cool) video|this is (gold|fire))[\s!.]*$",
    ),
    ("first", r"(?i)^(first|1st)[\s!.]*$"),
    (
        "sub_for_sub",
        r"(?i)\b(sub\s*(4|for)\s*sub|subscribe to (me|my channel)|sub to my channel)\b",
    ),
    (
        "self_promotion",
        r"(?i)\b(check out|visit|watch) my (channel|videos?|content)\b",
    ),
    (
        "emoji_only",
        r"^[\p{Extended_Pictographic}\p{S}\p{P}\s\u{200D}\u{FE0F}]+$",
    ),
    ("timestamp_only", r"^\d{1,2}:\d{2}(:\d{2})?\s*$"),
    (
        "watching_in_year",
        r"(?i)(who('?s| is)?\s+(still\s+)?watching\b.*\b(in\s+)?(19|20)\d{2}|^(19|20)\d{2}\s+anyone\b|\banyone\s+(here\s+)?in\s+(19|20)\d{2}\b)",
    ),
];

static DEFAULT_RULES: Lazy<Vec<SpamRule>> = Lazy::new(|| {
    DEFAULT_PATTERNS
        .iter()
        .filter_map(|(name, pattern)| SpamRule::new(*name, pattern).ok())
        .collect()
});

/// Ordered list of spam rules. New rules can be added without touching
/// filter control flow.
#[derive(Debug, Clone)]
pub struct SpamRules {
    rules: Vec<SpamRule>,
}

impl Default for SpamRules {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }
}

impl SpamRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: SpamRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn push(&mut self, rule: SpamRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Name of the first rule the text trips, if any.
    pub fn matching_rule(&self, text: &str) -> Option<&str> {
        let text = text.trim();
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(SpamRule::name)
    }

    pub fn is_spam(&self, text: &str) -> bool {
        self.matching_rule(text).is_some()
    }
}
