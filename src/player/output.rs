//! The audio-output seam the coordinator drives.
//!
//! An output owns the one playback resource. Starting playback is
//! asynchronous: `request_play` hands back a `RequestId` and the outcome
//! arrives later as `OutputEvent::PlayResolved`. Assigning a new source or
//! pausing supersedes any start still in flight, which then resolves with
//! `PlayError::Aborted`. Position and end-of-track events name the source
//! they were produced for, so reports about a replaced source can be told
//! apart from the current one.

use std::sync::mpsc::Sender;

/// Identifies one asynchronous request (a start-playback attempt or a remote call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Identifies one source assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// Identifies a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlayError {
    /// A newer source assignment or pause superseded the request.
    #[error("playback request superseded")]
    Aborted,

    /// The stream could not be fetched.
    #[error("failed to fetch stream: {0}")]
    Fetch(String),

    /// The stream is not decodable audio.
    #[error("failed to decode stream: {0}")]
    Decode(String),

    /// No usable audio device.
    #[error("audio device unavailable: {0}")]
    Device(String),
}

impl PlayError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// A start request finished.
    PlayResolved {
        request: RequestId,
        outcome: Result<(), PlayError>,
    },
    /// Position report; `duration` is `None` while unknown.
    TimeUpdate {
        source: SourceId,
        position: f64,
        duration: Option<f64>,
    },
    /// `source` played to its end.
    Ended { source: SourceId },
}

pub trait AudioOutput {
    /// Replace the source and rewind. Supersedes any in-flight start.
    fn set_source(&mut self, url: &str) -> SourceId;

    fn has_source(&self) -> bool;

    /// Ask the output to start playing the current source.
    fn request_play(&mut self) -> RequestId;

    /// Pause immediately. Supersedes any in-flight start.
    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Jump to `position` seconds. The output clamps to the playable range.
    fn seek(&mut self, position: f64);

    fn set_volume(&mut self, volume: f32);

    /// Start delivering events to `listener`.
    fn attach(&mut self, listener: Sender<OutputEvent>) -> ListenerId;

    fn detach(&mut self, id: ListenerId);
}
