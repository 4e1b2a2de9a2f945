//! Application model types: `App`, `InputMode` and `StatusLine`.
//!
//! The `App` struct holds the remote track list, the selection, the last
//! player snapshot and the transient UI state the views render.

use crate::api::{ApiClient, TrackDetail, TrackId, TrackSummary};
use crate::player::{Notice, PlayerSnapshot, PlayerUpdate, TrackRef};

use super::form::TrackForm;

/// What keystrokes currently feed into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing a fuzzy filter.
    Filter,
    /// Filling in the track form (edit or upload).
    Form(TrackForm),
    /// Waiting for `y` to delete the given track.
    ConfirmDelete { id: TrackId, title: String },
}

/// A one-line message in the status area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// The main application model.
pub struct App {
    pub tracks: Vec<TrackSummary>,
    /// Index into `tracks`.
    pub selected: usize,
    pub player: PlayerSnapshot,
    pub mode: InputMode,
    pub filter_query: String,
    pub status: Option<StatusLine>,
    /// Open detail popup.
    pub detail: Option<TrackDetail>,

    lower_titles: Option<Vec<String>>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<TrackSummary>) -> Self {
        let mut app = Self {
            tracks: Vec::new(),
            selected: 0,
            player: PlayerSnapshot::default(),
            mode: InputMode::Normal,
            filter_query: String::new(),
            status: None,
            detail: None,
            lower_titles: None,
        };
        app.set_tracks(tracks);
        app
    }

    /// Replace the track list, keeping the selection on the same track when it still exists.
    pub fn set_tracks(&mut self, tracks: Vec<TrackSummary>) {
        let keep = self.selected_track().map(|t| t.id);
        self.tracks = tracks;
        self.reindex(keep);
    }

    fn reindex(&mut self, keep: Option<TrackId>) {
        // For larger lists, precompute lowercase titles to speed up fuzzy
        // filtering (avoid per-char lowercase conversions on every keystroke).
        self.lower_titles = if self.tracks.len() > 100 {
            Some(self.tracks.iter().map(|t| t.title.to_ascii_lowercase()).collect())
        } else {
            None
        };

        match keep.and_then(|id| self.tracks.iter().position(|t| t.id == id)) {
            Some(i) => self.selected = i,
            None => self.selected = self.selected.min(self.tracks.len().saturating_sub(1)),
        }
        self.ensure_selected_visible();
    }

    pub fn selected_track(&self) -> Option<&TrackSummary> {
        self.tracks.get(self.selected)
    }

    /// Indices of `tracks` that pass the active filter, in list order.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.tracks.len()).collect();
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_ascii_lowercase();
                (0..self.tracks.len())
                    .filter(|&i| Self::fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some())
                    .collect()
            }
            None => (0..self.tracks.len())
                .filter(|&i| Self::fuzzy_match_positions(&self.tracks[i].title, query).is_some())
                .collect(),
        }
    }

    /// Fuzzy-match `query` against a specific track by index.
    ///
    /// Returns the character positions that match, or `None` when there is no match.
    pub fn fuzzy_match_positions_for_track(&self, track_index: usize, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                Self::fuzzy_match_positions_lower(&lower_titles[track_index], &query.to_ascii_lowercase())
            }
            None => Self::fuzzy_match_positions(&self.tracks[track_index].title, query),
        }
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Move selection to the next visible track, wrapping to the first.
    pub fn next(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            return;
        }
        self.selected = match display.iter().position(|&i| i == self.selected) {
            Some(p) => display[(p + 1) % display.len()],
            None => display[0],
        };
    }

    /// Move selection to the previous visible track, wrapping to the last.
    pub fn prev(&mut self) {
        let display = self.display_indices();
        let Some(&last) = display.last() else {
            return;
        };
        self.selected = match display.iter().position(|&i| i == self.selected) {
            Some(0) | None => last,
            Some(p) => display[p - 1],
        };
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    pub fn enter_filter_mode(&mut self) {
        self.mode = InputMode::Filter;
        self.ensure_selected_visible();
    }

    /// Leave filter mode, keeping the query applied.
    pub fn exit_filter_mode(&mut self) {
        self.mode = InputMode::Normal;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.mode = InputMode::Normal;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view,
    /// otherwise move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }
        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    /// Queue entry for `track`.
    pub fn track_ref(client: &ApiClient, track: &TrackSummary) -> TrackRef {
        let cover = track.has_cover().then(|| client.cover_url(track.id));
        TrackRef::from_summary(track, client.stream_url(track.id), cover)
    }

    /// The visible tracks that have audio, as a play queue.
    pub fn queue_for_view(&self, client: &ApiClient) -> Vec<TrackRef> {
        self.display_indices()
            .into_iter()
            .map(|i| &self.tracks[i])
            .filter(|t| t.has_audio())
            .map(|t| Self::track_ref(client, t))
            .collect()
    }

    /// Apply an update from the player.
    pub fn apply_update(&mut self, update: PlayerUpdate) {
        match update {
            PlayerUpdate::State(snapshot) => self.player = snapshot,
            PlayerUpdate::Notice(notice) => self.show_notice(&notice),
        }
    }

    pub fn show_notice(&mut self, notice: &Notice) {
        self.status = Some(StatusLine {
            text: notice.message(),
            is_error: notice.is_error(),
        });
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn open_form(&mut self, form: TrackForm) {
        self.mode = InputMode::Form(form);
        self.status = None;
    }

    /// The open form, for key handling.
    pub fn form_mut(&mut self) -> Option<&mut TrackForm> {
        match &mut self.mode {
            InputMode::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn close_form(&mut self) {
        if matches!(self.mode, InputMode::Form(_)) {
            self.mode = InputMode::Normal;
        }
    }

    pub fn begin_delete(&mut self) {
        if let Some(t) = self.selected_track() {
            self.mode = InputMode::ConfirmDelete {
                id: t.id,
                title: t.title.clone(),
            };
        }
    }

    /// Leave delete confirmation, returning the track to delete when `confirmed`.
    pub fn finish_delete(&mut self, confirmed: bool) -> Option<TrackId> {
        match std::mem::take(&mut self.mode) {
            InputMode::ConfirmDelete { id, .. } if confirmed => Some(id),
            _ => None,
        }
    }

    /// Apply a track the server returned after an edit.
    pub fn apply_detail(&mut self, detail: &TrackDetail) {
        let id = detail.summary.id;
        if let Some(t) = self.tracks.iter_mut().find(|t| t.id == id) {
            *t = detail.summary.clone();
        }
        if let Some(d) = self.detail.as_mut().filter(|d| d.summary.id == id) {
            *d = detail.clone();
        }
        let keep = self.selected_track().map(|t| t.id);
        self.reindex(keep);
    }

    /// Move the selection to `id`, clearing a filter that hides it.
    pub fn select_track(&mut self, id: TrackId) {
        let Some(i) = self.tracks.iter().position(|t| t.id == id) else {
            return;
        };
        if !self.display_indices().contains(&i) {
            self.filter_query.clear();
        }
        self.selected = i;
    }

    /// Drop a deleted track from the list. The selection moves to the
    /// track that took its place.
    pub fn remove_track(&mut self, id: TrackId) {
        if self.detail.as_ref().is_some_and(|d| d.summary.id == id) {
            self.detail = None;
        }
        let Some(at) = self.tracks.iter().position(|t| t.id == id) else {
            return;
        };
        self.tracks.remove(at);
        if at < self.selected {
            self.selected -= 1;
        }
        self.reindex(None);
    }

    pub fn open_detail(&mut self, detail: TrackDetail) {
        self.detail = Some(detail);
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }
}
