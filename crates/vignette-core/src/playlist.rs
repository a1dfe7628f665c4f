//! Playlist-input parsing and the small display helpers around it.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// How long a transient status message stays on screen.
const MESSAGE_TTL: Duration = Duration::from_secs(4);

/// Pull a playlist identifier out of pasted text: any string carrying a
/// `list=<id>` query parameter, or (permissively) a bare identifier with the
/// conventional `PL` prefix.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    static LIST_PARAM: OnceLock<Regex> = OnceLock::new();
    let re = LIST_PARAM.get_or_init(|| Regex::new(r"[?&]list=([^&\s]+)").unwrap());

    let input = input.trim();
    if let Some(caps) = re.captures(input) {
        return Some(caps[1].to_string());
    }
    if input.len() > 2
        && input.starts_with("PL")
        && input.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some(input.to_string());
    }
    None
}

/// `M:SS` with zero-padded seconds; `0:00` for anything unusable.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// User-facing message that dismisses itself after a few seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    expires_at: Duration,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, now: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: now + MESSAGE_TTL,
        }
    }

    pub fn visible(&self, now: Duration) -> bool {
        now < self.expires_at
    }
}
