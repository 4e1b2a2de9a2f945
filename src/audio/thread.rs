use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;
use crate::player::{OutputEvent, PlayError, RequestId, SourceId};

use super::sink::{create_sink, decode, end_position, is_spent, seek_target};
use super::types::{AudioCmd, Fetcher, Listeners, Shared, emit};

/// Everything the audio thread owns between commands.
struct Playback {
    stream: Option<OutputStream>,
    fetch: Fetcher,
    shared: Arc<Shared>,
    listeners: Listeners,

    source: Option<(SourceId, String)>,
    /// Fetched audio of the current source.
    bytes: Option<Arc<[u8]>>,
    sink: Option<Sink>,
    total: Option<Duration>,
    /// Last position reported while playing.
    last_pos: Duration,
    /// Seek requested before the source was decoded.
    pending_seek: Option<Duration>,
    volume: f32,
    playing: bool,
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    fetch: Fetcher,
    shared: Arc<Shared>,
    listeners: Listeners,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        // A missing device is reported per play request instead of aborting the app.
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped; noisy for a TUI app.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                error!(error = %e, "no audio output device");
                None
            }
        };

        let mut playback = Playback {
            stream,
            fetch,
            shared,
            listeners,
            source: None,
            bytes: None,
            sink: None,
            total: None,
            last_pos: Duration::ZERO,
            pending_seek: None,
            volume: 1.0,
            playing: false,
        };

        let tick = Duration::from_millis(audio_settings.tick_ms.max(1));
        loop {
            match rx.recv_timeout(tick) {
                Ok(AudioCmd::Load { source, url }) => playback.load(source, url),
                Ok(AudioCmd::Play {
                    request,
                    generation,
                }) => playback.play(request, generation),
                Ok(AudioCmd::Pause) => playback.pause(),
                Ok(AudioCmd::Seek(position)) => playback.seek(position),
                Ok(AudioCmd::SetVolume(v)) => {
                    playback.volume = v;
                    if let Some(s) = playback.sink.as_ref() {
                        s.set_volume(v);
                    }
                }
                Ok(AudioCmd::Quit { fade_out_ms }) => {
                    if let Some(s) = playback.sink.as_ref() {
                        if playback.playing {
                            fade_out_sink(s, playback.volume, fade_out_ms);
                        }
                        s.stop();
                    }
                    break;
                }
                Err(RecvTimeoutError::Timeout) => playback.tick(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

impl Playback {
    fn load(&mut self, source: SourceId, url: String) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        debug!(?source, %url, "source set");
        self.source = Some((source, url));
        self.bytes = None;
        self.total = None;
        self.last_pos = Duration::ZERO;
        self.pending_seek = None;
        self.playing = false;
    }

    fn play(&mut self, request: RequestId, generation: u64) {
        let outcome = self.start(generation);
        match &outcome {
            Ok(()) => self.playing = true,
            Err(PlayError::Aborted) => {}
            Err(e) => {
                warn!(?request, error = %e, "play request failed");
                if self.shared.is_current(generation) {
                    self.shared.set_paused(true);
                }
            }
        }
        emit(&self.listeners, OutputEvent::PlayResolved { request, outcome });
        if self.playing {
            self.report_time();
        }
    }

    fn start(&mut self, generation: u64) -> Result<(), PlayError> {
        if !self.shared.is_current(generation) {
            return Err(PlayError::Aborted);
        }

        // A finished sink is rebuilt from the start, like a fresh load.
        if is_spent(self.sink.as_ref()) {
            if let Some(s) = self.sink.take() {
                s.stop();
            }
            let bytes = match self.bytes.clone() {
                Some(bytes) => bytes,
                None => {
                    let url = self
                        .source
                        .as_ref()
                        .map(|(_, url)| url.clone())
                        .ok_or_else(|| PlayError::Fetch("no source set".to_string()))?;
                    let fetched: Arc<[u8]> = (self.fetch)(&url)
                        .map_err(|e| PlayError::Fetch(e.to_string()))?
                        .into();
                    // The source may have changed or playback paused while fetching.
                    if !self.shared.is_current(generation) {
                        return Err(PlayError::Aborted);
                    }
                    fetched
                }
            };
            let decoded = decode(bytes.clone())?;
            self.bytes = Some(bytes);
            let stream = self
                .stream
                .as_ref()
                .ok_or_else(|| PlayError::Device("no audio output device".to_string()))?;
            self.total = decoded.total;
            let sink = create_sink(stream, decoded, self.volume);
            self.last_pos = Duration::ZERO;
            if let Some(target) = self.pending_seek.take() {
                match sink.try_seek(target) {
                    Ok(()) => self.last_pos = target,
                    Err(e) => warn!(error = %e, "seek failed"),
                }
            }
            self.sink = Some(sink);
        }

        if let Some(s) = self.sink.as_ref() {
            s.play();
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
        self.playing = false;
    }

    fn seek(&mut self, position: f64) {
        let target = seek_target(position, self.total);
        match self.sink.as_ref().filter(|s| !s.empty()) {
            Some(s) => {
                if let Err(e) = s.try_seek(target) {
                    warn!(error = %e, "seek failed");
                }
                self.report_time();
            }
            // Applied once the sink is (re)built.
            None => self.pending_seek = Some(target),
        }
    }

    fn tick(&mut self) {
        if !self.playing {
            return;
        }
        let Some(s) = self.sink.as_ref() else {
            return;
        };
        if s.empty() {
            self.playing = false;
            self.shared.set_paused(true);
            let Some((source, _)) = self.source else {
                return;
            };
            emit(
                &self.listeners,
                OutputEvent::TimeUpdate {
                    source,
                    position: end_position(self.total, self.last_pos).as_secs_f64(),
                    duration: self.total.map(|t| t.as_secs_f64()),
                },
            );
            emit(&self.listeners, OutputEvent::Ended { source });
        } else {
            self.report_time();
        }
    }

    fn report_time(&mut self) {
        let (Some(s), Some((source, _))) = (self.sink.as_ref(), self.source.as_ref()) else {
            return;
        };
        self.last_pos = s.get_pos();
        emit(
            &self.listeners,
            OutputEvent::TimeUpdate {
                source: *source,
                position: self.last_pos.as_secs_f64(),
                duration: self.total.map(|t| t.as_secs_f64()),
            },
        );
    }
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
