use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, TrackDetail};
use crate::app::{App, InputMode, Submission, TrackForm};
use crate::audio::RodioOutput;
use crate::config;
use crate::player::{PlaybackCoordinator, PlayerUpdate, RemoteWorker};
use crate::runtime::startup::refresh_tracks;
use crate::ui;

pub type Player = PlaybackCoordinator<RodioOutput, RemoteWorker>;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// A validated form, sent after the next draw so its status shows first.
    pub pending_submit: Option<Submission>,
}

/// Main terminal event loop: handles input, UI drawing and applies player
/// updates. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player,
    client: &ApiClient,
    updates: &Receiver<PlayerUpdate>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        player.pump();
        while let Ok(update) = updates.try_recv() {
            app.apply_update(update);
        }

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, &settings.ui, settings.player.seek_seconds))?;

        if let Some(submission) = state.pending_submit.take() {
            send_submission(submission, app, client);
            continue;
        }

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key_event(key, settings, app, player, client, state) {
                break;
            }
        }
    }

    Ok(())
}

/// Returns true when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player,
    client: &ApiClient,
    state: &mut EventLoopState,
) -> bool {
    match app.mode {
        InputMode::Filter => {
            state.pending_gg = false;
            handle_filter_key(key, app, player, client);
            return false;
        }
        InputMode::Form(_) => {
            handle_form_key(key, app, state);
            return false;
        }
        InputMode::ConfirmDelete { .. } => {
            let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
            match app.finish_delete(confirmed) {
                Some(id) => match client.delete_track(id) {
                    Ok(()) => {
                        app.remove_track(id);
                        app.set_status("Track deleted");
                    }
                    Err(e) if e.status() == Some(404) => {
                        app.remove_track(id);
                        app.set_status("Track was already deleted");
                    }
                    Err(e) => {
                        warn!(track_id = id, error = %e, "delete failed");
                        app.set_error(format!("Delete failed: {e}"));
                    }
                },
                None => app.set_status("Delete cancelled"),
            }
            return false;
        }
        InputMode::Normal => {}
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => {
            if app.detail.is_some() {
                app.close_detail();
            } else {
                app.clear_status();
            }
        }
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => play_selected(app, player, client),
        KeyCode::Char('p') | KeyCode::Char(' ') => player.toggle(),
        KeyCode::Char('l') => player.next(),
        KeyCode::Char('h') => player.prev(),
        KeyCode::Char('L') => {
            let to = player.snapshot().progress + settings.player.seek_seconds as f64;
            player.seek(to);
        }
        KeyCode::Char('H') => {
            let to = (player.snapshot().progress - settings.player.seek_seconds as f64).max(0.0);
            player.seek(to);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let s = player.snapshot();
            player.set_volume(s.volume + settings.player.volume_step);
        }
        KeyCode::Char('-') => {
            let s = player.snapshot();
            player.set_volume(s.volume - settings.player.volume_step);
        }
        KeyCode::Char('m') => player.toggle_mute(),
        KeyCode::Char('f') => player.toggle_like(),
        KeyCode::Char('d') => {
            if player.current().is_none() {
                app.set_status("Nothing is playing");
            }
            player.download();
        }
        KeyCode::Char('K') => toggle_detail(app, client),
        KeyCode::Char('R') => refresh_tracks(client, app),
        KeyCode::Char('e') => open_edit_form(app, client),
        KeyCode::Char('u') => app.open_form(TrackForm::upload()),
        KeyCode::Char('X') => app.begin_delete(),
        _ => {}
    }

    false
}

fn handle_filter_key(key: KeyEvent, app: &mut App, player: &mut Player, client: &ApiClient) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => app.next(),
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.prev(),
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return;
            }
            app.exit_filter_mode();
            play_selected(app, player, client);
        }
        _ => {}
    }
}

fn handle_form_key(key: KeyEvent, app: &mut App, state: &mut EventLoopState) {
    let Some(form) = app.form_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            app.close_form();
            app.clear_status();
        }
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) if !c.is_control() => form.push_char(c),
        KeyCode::Enter => match form.submit() {
            Ok(submission) => {
                app.close_form();
                app.set_status(match submission {
                    Submission::Edit { .. } => "Saving…",
                    Submission::Upload(_) => "Uploading…",
                });
                state.pending_submit = Some(submission);
            }
            Err(message) => app.set_error(message),
        },
        _ => {}
    }
}

fn open_edit_form(app: &mut App, client: &ApiClient) {
    let Some(id) = app.selected_track().map(|t| t.id) else {
        return;
    };
    match client.get_track(id) {
        Ok(detail) => app.open_form(TrackForm::edit(&detail)),
        Err(e) => {
            warn!(track_id = id, error = %e, "failed to load track for editing");
            app.set_error(format!("Could not load track: {e}"));
        }
    }
}

fn send_submission(submission: Submission, app: &mut App, client: &ApiClient) {
    match submission {
        Submission::Edit {
            id,
            update,
            audio,
            cover,
        } => {
            let result = (|| -> Result<Option<TrackDetail>, ApiError> {
                let mut detail = None;
                if !update.is_empty() {
                    detail = Some(client.update_track(id, &update)?);
                }
                if let Some(path) = &audio {
                    detail = Some(client.replace_audio(id, path)?);
                }
                if let Some(path) = &cover {
                    detail = Some(client.replace_cover(id, path)?);
                }
                Ok(detail)
            })();
            match result {
                Ok(Some(detail)) => {
                    app.apply_detail(&detail);
                    app.set_status("Track updated");
                }
                Ok(None) => app.set_status("Nothing to save"),
                Err(e) => {
                    warn!(track_id = id, error = %e, "track update failed");
                    app.set_error(format!("Update failed: {e}"));
                }
            }
        }
        Submission::Upload(track) => match client.upload_track(&track) {
            Ok(detail) => {
                let id = detail.summary.id;
                info!(track_id = id, "track uploaded");
                refresh_tracks(client, app);
                app.select_track(id);
                app.set_status(format!("Uploaded \"{}\"", detail.summary.title));
            }
            Err(e) => {
                warn!(file = %track.file.display(), error = %e, "upload failed");
                app.set_error(format!("Upload failed: {e}"));
            }
        },
    }
}

/// Play the selected track with the visible list as the queue.
fn play_selected(app: &mut App, player: &mut Player, client: &ApiClient) {
    let Some(track) = app.selected_track() else {
        return;
    };
    if !track.has_audio() {
        app.set_error(format!("\"{}\" has no audio yet", track.title));
        return;
    }
    let already_playing = app.player.is_playing
        && app.player.current.as_ref().is_some_and(|c| c.id == track.id);
    if already_playing {
        return;
    }
    let track = App::track_ref(client, track);
    let queue = app.queue_for_view(client);
    player.play(track, Some(queue));
}

fn toggle_detail(app: &mut App, client: &ApiClient) {
    if app.detail.is_some() {
        app.close_detail();
        return;
    }
    let Some(id) = app.selected_track().map(|t| t.id) else {
        return;
    };
    match client.get_track(id) {
        Ok(detail) => app.open_detail(detail),
        Err(e) => {
            warn!(track_id = id, error = %e, "failed to load track details");
            app.set_error(format!("Could not load details: {e}"));
        }
    }
}
