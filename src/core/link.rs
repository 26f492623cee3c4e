//! Video link recognition.
//!
//! Recognized shapes:
//! - `youtube.com/watch?v=<id>`
//! - `youtube.com/shorts/<id>`
//! - `youtu.be/<id>`
//!
//! The identifier is always 11 characters from `[A-Za-z0-9_-]`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Length of a video identifier
pub const VIDEO_ID_LEN: usize = 11;

static VIDEO_URL: OnceLock<Regex> = OnceLock::new();

fn video_url_pattern() -> &'static Regex {
    VIDEO_URL.get_or_init(|| {
        Regex::new(&format!(
            r"(?:youtube\.com/(?:shorts/|watch\?v=)|youtu\.be/)([A-Za-z0-9_-]{{{}}})",
            VIDEO_ID_LEN
        ))
        .expect("video url pattern is valid")
    })
}

/// An 11-character video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video identifier from a link, if it has a recognized shape
pub fn extract_video_id(link: &str) -> Option<VideoId> {
    video_url_pattern()
        .captures(link.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}
