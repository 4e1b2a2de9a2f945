use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::app::App;
use crate::audio::RodioOutput;
use crate::logging;
use crate::player::{PlaybackCoordinator, RemoteWorker};

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();

    let _log_guard = logging::init(&settings.logging)?;
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }
    let client = ApiClient::new(&settings.api);
    info!(base_url = client.base_url(), user = client.user_id(), "starting");
    let mut app = App::new(Vec::new());
    startup::load_tracks(&client, &mut app);

    let output = RodioOutput::new(client.clone(), settings.audio.clone());
    let remote = RemoteWorker::spawn(client.clone());
    let mut player = PlaybackCoordinator::new(output, remote, startup::coordinator_options(&settings));
    let updates = player.subscribe();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut player,
            &client,
            &updates,
            &mut state,
        )
    })();

    // Fades out and joins the audio thread.
    drop(player);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("shut down");
    run_result
}
