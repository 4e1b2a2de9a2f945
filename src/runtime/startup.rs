use std::path::PathBuf;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::app::App;
use crate::config;
use crate::player::CoordinatorOptions;

pub fn coordinator_options(settings: &config::Settings) -> CoordinatorOptions {
    CoordinatorOptions {
        initial_volume: settings.player.initial_volume,
        download_dir: settings
            .player
            .download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Check the server and fetch the track list. Failures leave the list
/// empty and are reported in the status line.
pub fn load_tracks(client: &ApiClient, app: &mut App) {
    if !client.health() {
        app.set_error(format!("Server at {} is not reachable (R retries)", client.base_url()));
    }
    refresh_tracks(client, app);
}

pub fn refresh_tracks(client: &ApiClient, app: &mut App) {
    match client.list_tracks() {
        Ok(tracks) => {
            info!(count = tracks.len(), "track list loaded");
            let count = tracks.len();
            app.set_tracks(tracks);
            app.set_status(format!("{count} tracks"));
        }
        Err(e) => {
            warn!(error = %e, "failed to load tracks");
            app.set_error(format!("Failed to load tracks: {e}"));
        }
    }
}
