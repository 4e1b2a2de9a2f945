use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, error, info, warn};

use crate::api::{ApiError, LikeAck, TrackId};

use super::output::{AudioOutput, ListenerId, OutputEvent, PlayError, RequestId, SourceId};
use super::queue::Queue;
use super::remote::{RemoteEvent, RemoteTracks};
use super::types::{LikeState, Notice, PlayerSnapshot, PlayerUpdate, TrackRef};

/// Startup parameters for a [`PlaybackCoordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub initial_volume: f32,
    pub download_dir: PathBuf,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            download_dir: PathBuf::from("."),
        }
    }
}

/// Owns the audio output and the play queue, and is the only writer of
/// playback state.
///
/// Commands never fail: errors turn into state changes and [`Notice`]s.
/// Every mutation is followed by a [`PlayerSnapshot`] sent to subscribers.
/// Output and remote events are applied when the owner calls
/// [`pump`](Self::pump).
pub struct PlaybackCoordinator<O: AudioOutput, R: RemoteTracks> {
    output: O,
    remote: R,
    events: Receiver<OutputEvent>,
    remote_events: Receiver<RemoteEvent>,
    listener: ListenerId,
    /// Source currently assigned to the output; events for others are stale.
    source: Option<SourceId>,

    queue: Queue,
    is_playing: bool,
    progress: f64,
    duration: f64,
    like: LikeState,
    volume: f32,
    last_volume: f32,
    muted: bool,

    /// The only start request whose outcome may still change `is_playing`.
    pending: Option<RequestId>,

    download_dir: PathBuf,
    subscribers: Vec<Sender<PlayerUpdate>>,
}

impl<O: AudioOutput, R: RemoteTracks> PlaybackCoordinator<O, R> {
    pub fn new(mut output: O, mut remote: R, options: CoordinatorOptions) -> Self {
        let (tx, events) = mpsc::channel();
        let listener = output.attach(tx);
        let (remote_tx, remote_events) = mpsc::channel();
        remote.attach(remote_tx);

        let volume = if options.initial_volume.is_nan() {
            1.0
        } else {
            options.initial_volume.clamp(0.0, 1.0)
        };
        output.set_volume(volume);

        Self {
            output,
            remote,
            events,
            remote_events,
            listener,
            source: None,
            queue: Queue::default(),
            is_playing: false,
            progress: 0.0,
            duration: 0.0,
            like: LikeState::default(),
            volume,
            last_volume: if volume > 0.0 { volume } else { 1.0 },
            muted: volume == 0.0,
            pending: None,
            download_dir: options.download_dir,
            subscribers: Vec::new(),
        }
    }

    /// Receive a snapshot after every state change, plus notices.
    /// The current snapshot is delivered immediately.
    pub fn subscribe(&mut self) -> Receiver<PlayerUpdate> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(PlayerUpdate::State(self.snapshot()));
        self.subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current: self.queue.current().cloned(),
            is_playing: self.is_playing,
            progress: self.progress,
            duration: self.duration,
            liked: self.like.liked(),
            volume: self.volume,
            muted: self.muted,
            has_prev: self.queue.has_prev(),
            has_next: self.queue.has_next(),
            queue_len: self.queue.len(),
            queue_index: self.queue.index(),
        }
    }

    pub fn current(&self) -> Option<&TrackRef> {
        self.queue.current()
    }

    /// Apply every output and remote event received so far. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        while let Ok(event) = self.remote_events.try_recv() {
            self.handle_remote(event);
            handled += 1;
        }
        handled
    }

    /// Play `track`. With `queue`, that list becomes the queue; otherwise the
    /// existing queue is searched for `track`. A track missing from the
    /// chosen list plays as a queue of one.
    pub fn play(&mut self, track: TrackRef, queue: Option<Vec<TrackRef>>) {
        let candidates = queue.unwrap_or_else(|| self.queue.tracks().to_vec());
        self.queue = Queue::resolve(candidates, track);
        self.start_current();
    }

    /// Pause when playing, otherwise (re)start the current track.
    pub fn toggle(&mut self) {
        let Some(url) = self.queue.current().map(|t| t.stream_url.clone()) else {
            return;
        };

        if !self.output.has_source() {
            self.source = Some(self.output.set_source(&url));
        }

        if self.output.is_paused() {
            self.request_play();
        } else {
            self.output.pause();
            self.pending = None;
            self.is_playing = false;
            self.emit_state();
        }
    }

    /// Jump to `position` seconds. `progress` is updated without waiting
    /// for the output to report back.
    pub fn seek(&mut self, position: f64) {
        if !position.is_finite() || self.queue.current().is_none() {
            return;
        }
        self.output.seek(position);
        self.progress = position;
        self.emit_state();
    }

    pub fn prev(&mut self) {
        if !self.queue.has_prev() {
            return;
        }
        if let Some(i) = self.queue.index() {
            self.queue.select(i - 1);
            self.start_current();
        }
    }

    pub fn next(&mut self) {
        if !self.queue.has_next() {
            return;
        }
        if let Some(i) = self.queue.index() {
            self.queue.select(i + 1);
            self.start_current();
        }
    }

    /// Set the volume (clamped to `0.0..=1.0`). Zero counts as muted.
    pub fn set_volume(&mut self, value: f32) {
        if value.is_nan() {
            return;
        }
        let volume = value.clamp(0.0, 1.0);
        self.volume = volume;
        self.muted = volume == 0.0;
        self.output.set_volume(volume);
        self.emit_state();
    }

    pub fn toggle_mute(&mut self) {
        if self.muted {
            let restore = if self.last_volume > 0.0 {
                self.last_volume
            } else {
                1.0
            };
            self.set_volume(restore);
        } else {
            self.last_volume = if self.volume > 0.0 { self.volume } else { 1.0 };
            self.set_volume(0.0);
        }
    }

    /// Flip the like flag at once and ask the server to confirm it.
    ///
    /// The outcome is applied by [`pump`](Self::pump): success settles on
    /// the server's value, failure rolls back to the value before the
    /// first unsettled toggle.
    pub fn toggle_like(&mut self) {
        let Some(track_id) = self.queue.current().map(|t| t.id) else {
            return;
        };

        let (requested, previous) = match self.like {
            LikeState::Confirmed(v) => (!v, v),
            LikeState::Tentative {
                requested,
                previous,
                ..
            } => (!requested, previous),
        };
        let request = self.remote.request_like(track_id, requested);
        self.like = LikeState::Tentative {
            requested,
            previous,
            request,
        };
        self.emit_state();
    }

    /// Save the current track into the download directory in the background.
    pub fn download(&mut self) {
        let Some(track) = self.queue.current() else {
            return;
        };

        let track_id = track.id;
        let dest = self.download_dir.join(track.download_name());
        self.remote.request_download(track_id, &track.stream_url, &dest);
        self.notify(Notice::DownloadStarted {
            track_id,
            path: dest,
        });
    }

    fn start_current(&mut self) {
        let Some(track) = self.queue.current() else {
            return;
        };
        let url = track.stream_url.clone();
        debug!(
            track_id = track.id,
            title = %track.title,
            cover = ?track.cover_url,
            index = ?self.queue.index(),
            "loading track"
        );

        self.like = LikeState::default();
        self.progress = 0.0;
        self.duration = 0.0;

        self.source = Some(self.output.set_source(&url));
        self.output
            .set_volume(if self.muted { 0.0 } else { self.volume });
        self.request_play();
        self.emit_state();
    }

    fn request_play(&mut self) {
        let request = self.output.request_play();
        self.pending = Some(request);
    }

    fn handle_event(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::PlayResolved { request, outcome } => self.on_play_resolved(request, outcome),
            OutputEvent::TimeUpdate { source, .. } | OutputEvent::Ended { source }
                if self.source != Some(source) =>
            {
                debug!(?source, "ignoring event for a replaced source");
            }
            OutputEvent::TimeUpdate {
                position, duration, ..
            } => {
                if position.is_finite() {
                    self.progress = position;
                }
                self.duration = duration
                    .filter(|d| d.is_finite() && *d > 0.0)
                    .unwrap_or(0.0);
                self.emit_state();
            }
            OutputEvent::Ended { .. } => {
                if self.queue.has_next() {
                    self.next();
                } else {
                    self.pending = None;
                    self.is_playing = false;
                    self.emit_state();
                }
            }
        }
    }

    fn on_play_resolved(&mut self, request: RequestId, outcome: Result<(), PlayError>) {
        if self.pending != Some(request) {
            debug!(?request, "ignoring outcome of a superseded play request");
            return;
        }
        self.pending = None;

        match outcome {
            Ok(()) => self.is_playing = true,
            Err(e) if e.is_superseded() => {
                debug!(?request, "play request aborted");
                return;
            }
            Err(e) => {
                self.is_playing = false;
                let track_id = self.queue.current().map(|t| t.id).unwrap_or_default();
                error!(track_id, error = %e, "playback failed");
                self.notify(Notice::PlaybackFailed {
                    track_id,
                    reason: e.to_string(),
                });
            }
        }
        self.emit_state();
    }

    fn handle_remote(&mut self, event: RemoteEvent) {
        match event {
            RemoteEvent::Like {
                request,
                track_id,
                result,
            } => self.on_like_settled(request, track_id, result),
            RemoteEvent::Download {
                track_id,
                dest,
                result,
            } => match result {
                Ok(bytes) => {
                    info!(track_id, dest = %dest.display(), bytes, "download finished");
                    self.notify(Notice::Downloaded { path: dest });
                }
                Err(e) => {
                    warn!(track_id, error = %e, "download failed");
                    self.notify(Notice::DownloadFailed {
                        track_id,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    fn on_like_settled(&mut self, request: RequestId, track_id: TrackId, result: Result<LikeAck, ApiError>) {
        if self.queue.current().map(|t| t.id) != Some(track_id) {
            debug!(track_id, "ignoring like outcome for a track no longer loaded");
            return;
        }
        let LikeState::Tentative {
            requested,
            previous,
            request: latest,
        } = self.like
        else {
            debug!(track_id, ?request, "ignoring like outcome, state already settled");
            return;
        };

        if request != latest {
            // An older toggle reached the server; roll back to what it stored.
            if let Ok(ack) = result {
                self.like = LikeState::Tentative {
                    requested,
                    previous: ack.liked,
                    request: latest,
                };
            }
            return;
        }

        match result {
            Ok(ack) => {
                debug!(track_id = ack.track_id, liked = ack.liked, "like confirmed");
                self.like = LikeState::Confirmed(ack.liked);
            }
            Err(e) => {
                warn!(track_id, error = %e, "like request failed, rolling back");
                self.like = LikeState::Confirmed(previous);
                self.notify(Notice::LikeFailed {
                    track_id,
                    reason: e.to_string(),
                });
            }
        }
        self.emit_state();
    }

    fn emit_state(&mut self) {
        let snapshot = self.snapshot();
        self.broadcast(PlayerUpdate::State(snapshot));
    }

    fn notify(&mut self, notice: Notice) {
        self.broadcast(PlayerUpdate::Notice(notice));
    }

    fn broadcast(&mut self, update: PlayerUpdate) {
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

impl<O: AudioOutput, R: RemoteTracks> Drop for PlaybackCoordinator<O, R> {
    fn drop(&mut self) {
        self.output.detach(self.listener);
    }
}
