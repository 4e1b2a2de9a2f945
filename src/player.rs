//! Playback coordination: the queue, the player state machine and the
//! seam to the audio output and remote track service.

mod coordinator;
mod output;
mod queue;
mod remote;
mod types;

pub use coordinator::{CoordinatorOptions, PlaybackCoordinator};
pub use output::{AudioOutput, ListenerId, OutputEvent, PlayError, RequestId, SourceId};
pub use remote::RemoteWorker;
pub use types::*;

#[cfg(test)]
mod tests;
