//! Audio playback via `rodio` on a dedicated thread.
//!
//! [`RodioOutput`] is the handle the player talks to. Stream bytes are
//! fetched over HTTP on the audio thread when playback starts.

mod player;
mod sink;
mod thread;
mod types;

pub use player::RodioOutput;
