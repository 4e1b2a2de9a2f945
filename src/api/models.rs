//! Wire types for the track API.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type TrackId = i64;

/// One entry of `GET /tracks`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackSummary {
    pub id: TrackId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl TrackSummary {
    /// Whether the server has audio stored for this track.
    pub fn has_audio(&self) -> bool {
        self.audio_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
    }

    pub fn has_cover(&self) -> bool {
        self.cover_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty())
    }
}

/// `GET /tracks/{id}`: the summary plus generation metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackDetail {
    #[serde(flatten)]
    pub summary: TrackSummary,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub ai_model: Option<String>,
}

/// Body of `PATCH /tracks/{id}`. Unset fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl TrackUpdate {
    /// Whether the update would change anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Form of `POST /tracks/upload/direct`: the audio file plus metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTrack {
    pub file: PathBuf,
    pub title: String,
    pub ai_provider: String,
    pub ai_model: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub tags: Option<String>,
    pub cover_url: Option<String>,
}

/// Response of the like/unlike endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LikeAck {
    pub track_id: TrackId,
    pub liked: bool,
}
