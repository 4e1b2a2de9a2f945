//! Utilities for creating `rodio` sinks from fetched stream bytes.
//!
//! The helper here encapsulates decoding the bytes and preparing a paused
//! `Sink` at the requested volume.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::player::PlayError;

/// A decoded stream, ready to hand to a sink.
pub(super) struct Decoded {
    source: Decoder<Cursor<Arc<[u8]>>>,
    pub total: Option<Duration>,
}

/// Decode fetched bytes. The bytes are shared so a finished track can be
/// decoded again without fetching it twice.
pub(super) fn decode(bytes: Arc<[u8]>) -> Result<Decoded, PlayError> {
    let source = Decoder::new(Cursor::new(bytes)).map_err(|e| PlayError::Decode(e.to_string()))?;
    let total = source.total_duration();
    Ok(Decoded { source, total })
}

/// Create a paused `Sink` playing `decoded` at `volume`.
pub(super) fn create_sink(stream: &OutputStream, decoded: Decoded, volume: f32) -> Sink {
    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume);
    sink.append(decoded.source);
    sink.pause();
    sink
}

/// Clamp a requested position (seconds) into the playable range.
pub(super) fn seek_target(position: f64, total: Option<Duration>) -> Duration {
    let position = if position.is_finite() {
        position.max(0.0)
    } else {
        0.0
    };
    let target = Duration::from_secs_f64(position);
    match total {
        Some(t) => target.min(t),
        None => target,
    }
}

/// Whether playback has to build a new sink: none yet, or the last one
/// played everything it was given.
pub(super) fn is_spent(sink: Option<&Sink>) -> bool {
    sink.is_none_or(Sink::empty)
}

/// Position reported when a source finishes: its length when the decoder
/// knew it, otherwise the last position seen while playing.
pub(super) fn end_position(total: Option<Duration>, last_seen: Duration) -> Duration {
    total.unwrap_or(last_seen)
}
