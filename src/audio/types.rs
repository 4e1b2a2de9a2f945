//! Audio-thread commands and the state shared with the front handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::api::ApiError;
use crate::player::{ListenerId, OutputEvent, RequestId, SourceId};

#[derive(Debug)]
pub enum AudioCmd {
    /// Drop the current sink and remember `url` as the source.
    Load { source: SourceId, url: String },
    /// Fetch/decode the source if needed and start playing.
    /// `generation` is the front's generation when the request was made.
    Play { request: RequestId, generation: u64 },
    /// Pause the sink.
    Pause,
    /// Jump to the given position in seconds.
    Seek(f64),
    /// Set the sink volume.
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Loads the audio bytes behind a stream URL.
pub type Fetcher = Box<dyn Fn(&str) -> Result<Vec<u8>, ApiError> + Send>;

/// Registered event listeners.
pub type Listeners = Arc<Mutex<Vec<(ListenerId, Sender<OutputEvent>)>>>;

/// State both the front handle and the audio thread read.
#[derive(Debug, Default)]
pub struct Shared {
    /// Bumped by every source change and pause; a start request made under an
    /// older generation is superseded.
    pub generation: AtomicU64,
    pub paused: AtomicBool,
}

impl Shared {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            generation: AtomicU64::new(0),
            paused: AtomicBool::new(true),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate in-flight start requests.
    pub fn supersede(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Send `event` to every listener, forgetting the ones that hung up.
pub fn emit(listeners: &Listeners, event: OutputEvent) {
    if let Ok(mut l) = listeners.lock() {
        l.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}
