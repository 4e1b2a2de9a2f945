//! Ordered play queue with a cursor.

use super::types::TrackRef;

/// Tracks plus the position of the current one.
///
/// `index` is either `None` or a valid position in `tracks`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    tracks: Vec<TrackRef>,
    index: Option<usize>,
}

impl Queue {
    /// Queue positioned at `index`; out-of-range positions leave no selection.
    pub fn new(tracks: Vec<TrackRef>, index: usize) -> Self {
        let index = (index < tracks.len()).then_some(index);
        Self { tracks, index }
    }

    pub fn single(track: TrackRef) -> Self {
        Self {
            tracks: vec![track],
            index: Some(0),
        }
    }

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&TrackRef> {
        self.index.and_then(|i| self.tracks.get(i))
    }

    pub fn has_prev(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.tracks.len())
    }

    /// Move the cursor to `index` if it is in range.
    pub fn select(&mut self, index: usize) -> Option<&TrackRef> {
        if index < self.tracks.len() {
            self.index = Some(index);
        }
        self.current()
    }

    /// Queue that `play` should use for `track`: `candidates` when it contains
    /// the track (cursor on it), otherwise a queue of just `track`.
    pub fn resolve(candidates: Vec<TrackRef>, track: TrackRef) -> Self {
        match candidates.iter().position(|t| t.id == track.id) {
            Some(i) => Self::new(candidates, i),
            None => Self::single(track),
        }
    }
}
