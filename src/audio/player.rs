use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::api::ApiClient;
use crate::config::AudioSettings;
use crate::player::{AudioOutput, ListenerId, OutputEvent, RequestId, SourceId};

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, Fetcher, Listeners, Shared};

/// `rodio`-backed [`AudioOutput`]. Decoding and playback happen on a
/// dedicated audio thread; this handle only sends commands to it.
pub struct RodioOutput {
    tx: Sender<AudioCmd>,
    shared: Arc<Shared>,
    listeners: Listeners,
    join: Option<JoinHandle<()>>,
    fade_out: Duration,

    source: Option<String>,
    next_source: u64,
    next_request: u64,
    next_listener: u64,
}

impl RodioOutput {
    /// Play streams fetched through `client`.
    pub fn new(client: ApiClient, audio_settings: AudioSettings) -> Self {
        Self::with_fetcher(
            Box::new(move |url: &str| client.fetch_bytes(url)),
            audio_settings,
        )
    }

    pub fn with_fetcher(fetch: Fetcher, audio_settings: AudioSettings) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let shared = Shared::new();
        let listeners: Listeners = Arc::new(Mutex::new(Vec::new()));
        let fade_out = Duration::from_millis(audio_settings.quit_fade_out_ms);

        let audio_handle = spawn_audio_thread(
            rx,
            fetch,
            shared.clone(),
            listeners.clone(),
            audio_settings,
        );

        Self {
            tx,
            shared,
            listeners,
            join: Some(audio_handle),
            fade_out,
            source: None,
            next_source: 0,
            next_request: 0,
            next_listener: 0,
        }
    }

    fn send(&self, cmd: AudioCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("audio thread is gone, dropping command");
        }
    }

    /// Fade out, stop the audio thread and wait for it.
    pub fn quit_softly(&mut self) {
        self.send(AudioCmd::Quit {
            fade_out_ms: self.fade_out.as_millis() as u64,
        });
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl AudioOutput for RodioOutput {
    fn set_source(&mut self, url: &str) -> SourceId {
        self.shared.supersede();
        self.shared.set_paused(true);
        self.next_source += 1;
        let source = SourceId(self.next_source);
        self.source = Some(url.to_string());
        self.send(AudioCmd::Load {
            source,
            url: url.to_string(),
        });
        source
    }

    fn has_source(&self) -> bool {
        self.source.is_some()
    }

    fn request_play(&mut self) -> RequestId {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        self.shared.set_paused(false);
        self.send(AudioCmd::Play {
            request,
            generation: self.shared.generation(),
        });
        request
    }

    fn pause(&mut self) {
        self.shared.supersede();
        self.shared.set_paused(true);
        self.send(AudioCmd::Pause);
    }

    fn is_paused(&self) -> bool {
        self.shared.is_paused()
    }

    fn seek(&mut self, position: f64) {
        self.send(AudioCmd::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(AudioCmd::SetVolume(volume.clamp(0.0, 1.0)));
    }

    fn attach(&mut self, listener: Sender<OutputEvent>) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        if let Ok(mut l) = self.listeners.lock() {
            l.push((id, listener));
        }
        id
    }

    fn detach(&mut self, id: ListenerId) {
        if let Ok(mut l) = self.listeners.lock() {
            l.retain(|(l, _)| *l != id);
        }
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.quit_softly();
    }
}
