//! Value types shared between the coordinator and the views.

use std::path::PathBuf;

use crate::api::{TrackId, TrackSummary};

use super::output::RequestId;

/// A playable queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRef {
    pub id: TrackId,
    pub title: String,
    /// Resolved address the audio output loads.
    pub stream_url: String,
    pub cover_url: Option<String>,
    /// Suggested file name (without extension) for downloads.
    pub filename: Option<String>,
}

impl TrackRef {
    /// Build a queue entry for `track`, resolving URLs through `stream_url`/`cover_url`.
    pub fn from_summary(track: &TrackSummary, stream_url: String, cover_url: Option<String>) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            stream_url,
            cover_url,
            filename: Some(track.title.clone()),
        }
    }

    /// Name used when saving the track: `filename` or `title`, made safe for paths.
    pub fn download_name(&self) -> String {
        let base = self
            .filename
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.title.trim());
        let cleaned: String = base
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
        if cleaned.is_empty() {
            format!("track-{}.mp3", self.id)
        } else {
            format!("{cleaned}.mp3")
        }
    }
}

/// Like flag of the current track.
///
/// A toggle first records a `Tentative` value, then settles to `Confirmed`
/// with either the server's answer or `previous`. Only the outcome of
/// `request`, the latest toggle, settles the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Confirmed(bool),
    Tentative {
        requested: bool,
        previous: bool,
        request: RequestId,
    },
}

impl LikeState {
    /// The value shown to the user.
    pub fn liked(self) -> bool {
        match self {
            Self::Confirmed(v) => v,
            Self::Tentative { requested, .. } => requested,
        }
    }
}

impl Default for LikeState {
    fn default() -> Self {
        Self::Confirmed(false)
    }
}

/// Everything a view needs to render the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub current: Option<TrackRef>,
    pub is_playing: bool,
    /// Elapsed seconds.
    pub progress: f64,
    /// Track length in seconds, 0 while unknown.
    pub duration: f64,
    pub liked: bool,
    pub volume: f32,
    pub muted: bool,
    pub has_prev: bool,
    pub has_next: bool,
    pub queue_len: usize,
    pub queue_index: Option<usize>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            current: None,
            is_playing: false,
            progress: 0.0,
            duration: 0.0,
            liked: false,
            volume: 1.0,
            muted: false,
            has_prev: false,
            has_next: false,
            queue_len: 0,
            queue_index: None,
        }
    }
}

/// Diagnostics for the user; commands never fail loudly, they report here.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    PlaybackFailed { track_id: TrackId, reason: String },
    LikeFailed { track_id: TrackId, reason: String },
    DownloadStarted { track_id: TrackId, path: PathBuf },
    Downloaded { path: PathBuf },
    DownloadFailed { track_id: TrackId, reason: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Self::PlaybackFailed { reason, .. } => format!("Playback failed: {reason}"),
            Self::LikeFailed { .. } => "Like request failed.".to_string(),
            Self::DownloadStarted { path, .. } => format!("Downloading to {}…", path.display()),
            Self::Downloaded { path } => format!("Saved {}", path.display()),
            Self::DownloadFailed { reason, .. } => format!("Download failed: {reason}"),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::PlaybackFailed { .. } | Self::LikeFailed { .. } | Self::DownloadFailed { .. }
        )
    }
}

/// What subscribers receive from the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerUpdate {
    State(PlayerSnapshot),
    Notice(Notice),
}
