use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use multipart::client::lazy::Multipart;
use tracing::{debug, info, warn};
use ureq::Agent;

use crate::config::ApiSettings;

use super::error::ApiError;
use super::models::{LikeAck, NewTrack, TrackDetail, TrackId, TrackSummary, TrackUpdate};

/// Header the API accepts in place of a bearer token during development.
pub const USER_HEADER: &str = "X-User-Id";
/// Identity used when no user id is configured.
pub const DEFAULT_USER_ID: &str = "1";

/// Upper bound for audio bodies buffered in memory for playback.
const MAX_STREAM_BYTES: u64 = 256 * 1024 * 1024;

/// Blocking client for the track API.
///
/// Cheap to clone: clones share the underlying connection pool.
///
/// JSON calls must finish within the configured timeout. Audio transfers
/// (streams, downloads, uploads) only bound connecting and waiting for the
/// response head, since moving the body can take much longer.
#[derive(Clone)]
pub struct ApiClient {
    agent: Agent,
    transfer_agent: Agent,
    base_url: String,
    user_id: String,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Self {
        let timeout = Some(Duration::from_millis(settings.timeout_ms));
        let config = Agent::config_builder().timeout_global(timeout).build();
        let transfer_config = Agent::config_builder()
            .timeout_connect(timeout)
            .timeout_recv_response(timeout)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            transfer_agent: Agent::new_with_config(transfer_config),
            base_url: settings.base_url.trim().trim_end_matches('/').to_string(),
            user_id: settings
                .user_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_USER_ID)
                .to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Join `path` onto the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Playable address for a track's audio.
    pub fn stream_url(&self, id: TrackId) -> String {
        self.url(&format!("tracks/{id}/stream"))
    }

    pub fn cover_url(&self, id: TrackId) -> String {
        self.url(&format!("tracks/{id}/cover"))
    }

    /// One-shot connectivity check. Logs the outcome and returns whether the API answered.
    pub fn health(&self) -> bool {
        let url = self.url("health");
        match self.agent.get(&url).header(USER_HEADER, self.user_id.as_str()).call() {
            Ok(_) => {
                info!(base_url = %self.base_url, "connected to track API");
                true
            }
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "track API is unreachable");
                false
            }
        }
    }

    pub fn list_tracks(&self) -> Result<Vec<TrackSummary>, ApiError> {
        let url = self.url("tracks");
        let mut res = self
            .agent
            .get(&url)
            .header(USER_HEADER, self.user_id.as_str())
            .call()
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        let tracks: Vec<TrackSummary> = res
            .body_mut()
            .read_json()
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        debug!(count = tracks.len(), "listed tracks");
        Ok(tracks)
    }

    pub fn get_track(&self, id: TrackId) -> Result<TrackDetail, ApiError> {
        let url = self.url(&format!("tracks/{id}"));
        let mut res = self
            .agent
            .get(&url)
            .header(USER_HEADER, self.user_id.as_str())
            .call()
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        res.body_mut()
            .read_json()
            .map_err(|e| ApiError::from_ureq(&url, e))
    }

    pub fn update_track(&self, id: TrackId, update: &TrackUpdate) -> Result<TrackDetail, ApiError> {
        let url = self.url(&format!("tracks/{id}"));
        let mut res = self
            .agent
            .patch(&url)
            .header(USER_HEADER, self.user_id.as_str())
            .send_json(update)
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        info!(track_id = id, "updated track metadata");
        res.body_mut()
            .read_json()
            .map_err(|e| ApiError::from_ureq(&url, e))
    }

    pub fn delete_track(&self, id: TrackId) -> Result<(), ApiError> {
        let url = self.url(&format!("tracks/{id}"));
        self.agent
            .delete(&url)
            .header(USER_HEADER, self.user_id.as_str())
            .call()
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        info!(track_id = id, "deleted track");
        Ok(())
    }

    pub fn like(&self, id: TrackId) -> Result<LikeAck, ApiError> {
        let url = self.like_url(id);
        let mut res = self
            .agent
            .post(&url)
            .header(USER_HEADER, self.user_id.as_str())
            .send_empty()
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        res.body_mut()
            .read_json()
            .map_err(|e| ApiError::from_ureq(&url, e))
    }

    pub fn unlike(&self, id: TrackId) -> Result<LikeAck, ApiError> {
        let url = self.like_url(id);
        let mut res = self
            .agent
            .delete(&url)
            .header(USER_HEADER, self.user_id.as_str())
            .call()
            .map_err(|e| ApiError::from_ureq(&url, e))?;
        res.body_mut()
            .read_json()
            .map_err(|e| ApiError::from_ureq(&url, e))
    }

    fn like_url(&self, id: TrackId) -> String {
        self.url(&format!("interactions/tracks/{id}/like"))
    }

    /// Buffer a whole audio body in memory (used by the audio thread).
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let mut res = self
            .transfer_agent
            .get(url)
            .header(USER_HEADER, self.user_id.as_str())
            .call()
            .map_err(|e| ApiError::from_ureq(url, e))?;
        let bytes = res
            .body_mut()
            .with_config()
            .limit(MAX_STREAM_BYTES)
            .read_to_vec()
            .map_err(|e| ApiError::from_ureq(url, e))?;
        debug!(url, bytes = bytes.len(), "fetched stream");
        Ok(bytes)
    }

    /// Stream `url` into `dest`. A partially written file is removed on failure.
    pub fn download(&self, url: &str, dest: &Path) -> Result<u64, ApiError> {
        let res = self
            .transfer_agent
            .get(url)
            .header(USER_HEADER, self.user_id.as_str())
            .call()
            .map_err(|e| ApiError::from_ureq(url, e))?;

        let mut reader = res.into_body().into_reader();
        let mut file = File::create(dest)?;
        match io::copy(&mut reader, &mut file) {
            Ok(written) => {
                info!(url, dest = %dest.display(), bytes = written, "saved track");
                Ok(written)
            }
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(dest);
                Err(ApiError::Io(e))
            }
        }
    }

    /// Create a track from a local audio file (`POST /tracks/upload/direct`).
    pub fn upload_track(&self, track: &NewTrack) -> Result<TrackDetail, ApiError> {
        let url = self.url("tracks/upload/direct");
        let mut form = Multipart::new();
        form.add_file("file", track.file.as_path())
            .add_text("title", track.title.as_str())
            .add_text("ai_provider", track.ai_provider.as_str())
            .add_text("ai_model", track.ai_model.as_str());
        let optional = [
            ("description", &track.description),
            ("genre", &track.genre),
            ("tags", &track.tags),
            ("cover_url", &track.cover_url),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                form.add_text(name, v.as_str());
            }
        }

        let created = self.send_form(&url, &mut form)?;
        info!(track_id = created.summary.id, file = %track.file.display(), "uploaded track");
        Ok(created)
    }

    /// Replace a track's audio (`POST /tracks/{id}/upload/replace`).
    pub fn replace_audio(&self, id: TrackId, file: &Path) -> Result<TrackDetail, ApiError> {
        let url = self.url(&format!("tracks/{id}/upload/replace"));
        let mut form = Multipart::new();
        form.add_file("file", file);
        let updated = self.send_form(&url, &mut form)?;
        info!(track_id = id, file = %file.display(), "replaced track audio");
        Ok(updated)
    }

    /// Replace a track's cover image (`POST /tracks/{id}/upload/cover`).
    pub fn replace_cover(&self, id: TrackId, file: &Path) -> Result<TrackDetail, ApiError> {
        let url = self.url(&format!("tracks/{id}/upload/cover"));
        let mut form = Multipart::new();
        form.add_file("cover_file", file);
        let updated = self.send_form(&url, &mut form)?;
        info!(track_id = id, file = %file.display(), "replaced track cover");
        Ok(updated)
    }

    /// POST a multipart form and decode the track the server answers with.
    fn send_form(&self, url: &str, form: &mut Multipart<'_, '_>) -> Result<TrackDetail, ApiError> {
        let mut prepared = form.prepare().map_err(|e| ApiError::Io(e.error))?;
        let content_type = format!("multipart/form-data; boundary={}", prepared.boundary());
        let mut body = Vec::new();
        prepared.read_to_end(&mut body)?;
        debug!(url, bytes = body.len(), "sending form");

        let mut res = self
            .transfer_agent
            .post(url)
            .header(USER_HEADER, self.user_id.as_str())
            .header("Content-Type", content_type.as_str())
            .send(&body[..])
            .map_err(|e| ApiError::from_ureq(url, e))?;
        res.body_mut()
            .read_json()
            .map_err(|e| ApiError::from_ureq(url, e))
    }
}
