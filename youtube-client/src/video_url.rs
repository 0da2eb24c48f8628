use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_URL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:(?:www|m|music)\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .ok()
});

/// 11-character video id from any of the usual YouTube URL shapes.
pub fn parse_video_id(input: &str) -> Option<String> {
    VIDEO_URL
        .as_ref()?
        .captures(input.trim())
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

pub fn is_youtube_video_url(input: &str) -> bool {
    parse_video_id(input).is_some()
}
