use url::Url;

/// Canonical post id (base36, no `t3_` prefix) from a Reddit post URL.
///
/// Accepts `reddit.com/r/<sub>/comments/<id>/...` on any reddit.com
/// subdomain, `reddit.com/comments/<id>` and `redd.it/<id>`. Share links
/// (`/r/<sub>/s/<token>`) need a redirect to resolve and are rejected.
pub fn parse_post_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    let candidate = if host == "redd.it" {
        segments.first().copied()
    } else if host == "reddit.com" || host.ends_with(".reddit.com") {
        match segments.as_slice() {
            ["r", _, "comments", id, ..] => Some(*id),
            ["comments", id, ..] => Some(*id),
            ["user", _, "comments", id, ..] | ["u", _, "comments", id, ..] => Some(*id),
            _ => None,
        }
    } else {
        None
    };

    candidate
        .map(|id| id.trim_start_matches("t3_").to_ascii_lowercase())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()))
}

pub fn is_reddit_post_url(input: &str) -> bool {
    parse_post_id(input).is_some()
}
