use log::{error, info, warn};
use std::io;
use std::process::ExitCode;
use tokio::sync::mpsc;

// Project Modules
mod api_client;
mod config;
mod errors;
mod external_player;
mod media_deck;
mod model;
mod playback;
mod playlist;
mod session;
mod status_line;
mod transport;

use api_client::ApiClient;
use config::{AppConfig, DEFAULT_CONFIG_PATH};
use errors::{ApiError, AppError};
use external_player::CommandElement;
use media_deck::MediaDeck;
use model::{AppState, MediaKind, SlideshowSource};
use playback::PlaybackController;
use playlist::Playlist;
use session::run_session;
use status_line::{frame_for, state_lines, StatusLine};
use transport::KeyBinding;

/// What the screen shows once the fetch has resolved.
fn state_for_load(source: &SlideshowSource, outcome: &Result<Playlist, ApiError>) -> AppState {
    match outcome {
        Ok(playlist) if playlist.is_empty() => AppState::NoPlayableMedia,
        Ok(_) => AppState::Slideshow,
        Err(e) if e.requires_login() && !source.is_public() => AppState::LoginRequired(e.user_message()),
        Err(e) => AppState::Error(e.user_message()),
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let mut screen = StatusLine::new(io::stdout());
    screen.draw(&state_lines(&AppState::Loading))?;

    let client = ApiClient::new(&config);
    let fetched = client.fetch_slideshow(&config.source).await;
    let title = fetched.as_ref().ok().and_then(|f| f.batch_name.clone());
    let outcome = fetched.map(|f| Playlist::from_records(&f.items, &config.source, client.base_url()));

    let state = state_for_load(&config.source, &outcome);
    info!("Slideshow for {} resolved to {:?}", config.source, state);
    let playlist = match (state, outcome) {
        (AppState::Slideshow, Ok(playlist)) => playlist,
        (state, _) => {
            screen.draw(&state_lines(&state))?;
            return Ok(());
        }
    };

    let (signal_tx, mut signals) = mpsc::unbounded_channel();
    let deck = MediaDeck::new(
        CommandElement::new(MediaKind::Image, config.players.image.clone(), signal_tx.clone()),
        CommandElement::new(MediaKind::Video, config.players.video.clone(), signal_tx.clone()),
        CommandElement::new(MediaKind::Audio, config.players.audio.clone(), signal_tx),
    );
    let mut controller = PlaybackController::new(playlist, deck, config.image_duration);

    let (command_tx, mut commands) = mpsc::unbounded_channel();
    let binding = KeyBinding::install(command_tx)?;
    let exit = run_session(&mut controller, &mut commands, &mut signals, |c| {
        if let Err(e) = screen.draw(&frame_for(c, title.as_deref())) {
            warn!("Failed to draw status line: {}", e);
        }
    })
    .await;
    binding.uninstall().await;
    info!("Slideshow finished ({:?}).", exit);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting lightbox-slideshow...");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let app_config = match config::load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
