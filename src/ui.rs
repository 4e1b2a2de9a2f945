//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::api::TrackDetail;
use crate::app::{App, FormTarget, InputMode, TrackForm};
use crate::config::{TimeField, UiSettings};
use crate::player::PlayerSnapshot;

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play"),
    ("space/p", "play/pause"),
    ("h/l", "prev/next"),
    ("+/-", "volume"),
    ("m", "mute"),
    ("f", "like"),
    ("d", "download"),
    ("K", "details"),
    ("e", "edit"),
    ("u", "upload"),
    ("X", "delete"),
    ("R", "refresh"),
    ("/", "filter"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_seconds: u64) -> String {
    let mut parts: Vec<String> = CONTROLS.iter().map(|(k, v)| format!("[{k}] {v}")).collect();
    // Keep seeking next to the track navigation keys.
    parts.insert(5, format!("[H/L] seek -/+{seek_seconds}s"));
    parts.join(" | ")
}

/// Format seconds as `MM:SS`.
fn format_mmss(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
/// Total and remaining are left out while the duration is unknown.
fn now_playing_time_text(player: &PlayerSnapshot, ui: &UiSettings) -> Option<String> {
    let known = player.duration > 0.0;
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(player.progress)),
            TimeField::Total if known => Some(format_mmss(player.duration)),
            TimeField::Remaining if known => Some(format!(
                "-{}",
                format_mmss((player.duration - player.progress).max(0.0))
            )),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// The status line describing the player.
fn player_status_text(player: &PlayerSnapshot, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    match &player.current {
        Some(track) => {
            let song = match now_playing_time_text(player, ui) {
                Some(time) => format!("Song: {} [{}]", track.title, time),
                None => format!("Song: {}", track.title),
            };
            parts.push(song);
            parts.push(if player.is_playing { "Playing" } else { "Paused" }.to_string());
            if player.liked {
                parts.push("♥ Liked".to_string());
            }
        }
        None => parts.push("Stopped".to_string()),
    }

    if player.muted {
        parts.push("VOL: muted".to_string());
    } else {
        parts.push(format!("VOL: {:.0}%", player.volume * 100.0));
    }

    if let Some(i) = player.queue_index {
        let prev = if player.has_prev { "<" } else { " " };
        let next = if player.has_next { ">" } else { " " };
        parts.push(format!("QUEUE: {prev} {}/{} {next}", i + 1, player.queue_len));
    }

    parts.join(" • ")
}

/// The second status line: filter, input prompt or the last message.
fn prompt_text(app: &App) -> Option<(String, bool)> {
    match &app.mode {
        InputMode::Form(_) => {
            // Validation errors stay visible while the form is open.
            if let Some(status) = app.status.as_ref().filter(|s| s.is_error) {
                return Some((status.text.clone(), true));
            }
            return Some((
                "tab/↓ next field • shift-tab/↑ previous • enter saves • esc cancels".to_string(),
                false,
            ));
        }
        InputMode::ConfirmDelete { title, .. } => {
            return Some((format!("Delete \"{title}\"? (y/n)"), true));
        }
        InputMode::Filter => return Some((format!("FILTER: {}_", app.filter_query), false)),
        InputMode::Normal => {}
    }
    if let Some(status) = &app.status {
        return Some((status.text.clone(), status.is_error));
    }
    let q = app.filter_query.trim();
    (!q.is_empty()).then(|| (format!("FILTER: {q}"), false))
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn detail_text(detail: &TrackDetail) -> String {
    let or_dash = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("-")
            .to_string()
    };
    let s = &detail.summary;
    let model = match (&detail.ai_provider, &detail.ai_model) {
        (Some(p), Some(m)) => format!("{p} / {m}"),
        (p, m) => or_dash(if p.is_some() { p } else { m }),
    };
    format!(
        "Title: {}\nDescription: {}\nGenre: {}\nTags: {}\nStatus: {}\nModel: {}\nCreated: {}\nAudio: {}",
        s.title,
        or_dash(&s.description),
        or_dash(&detail.genre),
        or_dash(&detail.tags),
        s.status,
        model,
        s.created_at,
        if s.has_audio() { "yes" } else { "no" },
    )
}

fn form_title(form: &TrackForm) -> String {
    match form.target {
        FormTarget::Edit(id) => format!(" edit track #{id} "),
        FormTarget::Upload => " upload track ".to_string(),
    }
}

/// One line per field; the focused one is marked and shows a cursor.
fn form_text(form: &TrackForm) -> String {
    let width = form
        .fields
        .iter()
        .map(|(f, _)| f.label().len())
        .max()
        .unwrap_or(0);
    form.fields
        .iter()
        .map(|(field, value)| {
            let focused = *field == form.focused();
            format!(
                "{} {:<width$}  {}{}",
                if focused { ">" } else { " " },
                field.label(),
                value,
                if focused { "_" } else { "" },
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Uppercase the characters of `title` at `positions`.
fn highlight(title: &str, positions: &[usize]) -> String {
    let mut rendered = String::with_capacity(title.len());
    let mut pos_iter = positions.iter().copied();
    let mut next_pos = pos_iter.next();
    for (ci, ch) in title.chars().enumerate() {
        if next_pos == Some(ci) {
            rendered.extend(ch.to_uppercase());
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, display: &[usize], ui_settings: &UiSettings, seek_seconds: u64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let mut status_lines = vec![Line::from(player_status_text(&app.player, ui_settings))];
    if let Some((text, is_error)) = prompt_text(app) {
        let style = if is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        status_lines.push(Line::styled(text, style));
    }
    let status_par = Paragraph::new(status_lines)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        let q = app.filter_query.trim();
        let playing_id = app.player.current.as_ref().map(|t| t.id);

        // Center the selected item when possible by creating a visible window.
        // Only build ListItems for the visible window.
        let total = display.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| {
                let track = &app.tracks[i];
                let title = match app.fuzzy_match_positions_for_track(i, q) {
                    Some(positions) if !q.is_empty() => highlight(&track.title, &positions),
                    _ => track.title.clone(),
                };
                let marker = if playing_id == Some(track.id) { "♪ " } else { "  " };
                let item = ListItem::new(format!("{marker}{title}"));
                if track.has_audio() {
                    item
                } else {
                    item.style(Style::default().add_modifier(Modifier::DIM))
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Overlay detail popup (keeps list visible under it)
    if let Some(detail) = &app.detail {
        let popup_area = centered_rect_sized(72, 10, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let detail_paragraph = Paragraph::new(detail_text(detail))
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" details (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(detail_paragraph, popup_area);
    }

    if let InputMode::Form(form) = &app.mode {
        let popup_area = centered_rect_sized(80, form.fields.len() as u16 + 2, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let form_paragraph = Paragraph::new(form_text(form)).block(
            Block::default()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .borders(Borders::ALL)
                .title(form_title(form)),
        );
        frame.render_widget(form_paragraph, popup_area);
    }

    let footer = Paragraph::new(controls_text(seek_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
