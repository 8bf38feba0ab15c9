//! Handles application configuration loading and management.
//!
//! This module defines the `AppConfig` struct which holds the API base URL, the optional
//! bearer token, which slideshow to play, the image display duration and the external
//! player commands. It is passed explicitly to the API client and the session; nothing
//! here is global.
//!
//! ```ini
//! [api]
//! base_url = http://localhost:5005
//! auth_token = ...
//!
//! [slideshow]
//! share_token = abc123
//! image_duration_ms = 15000
//!
//! [players]
//! video = mpv --really-quiet --fs
//! audio = mpv --really-quiet --no-video
//! ```

use super::errors::ConfigError;
use super::model::SlideshowSource;
use configparser::ini::Ini;
use log::{debug, error, info};
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/lightbox-slideshow.conf";

/// How long an image stays on screen when nothing else advances the slideshow.
pub const DEFAULT_IMAGE_DURATION: Duration = Duration::from_millis(15_000);

/// A program plus its leading arguments; the media URL is appended when it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    /// Splits a command line on whitespace. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self { program, args: parts.collect() })
    }
}

/// External programs used to play each media family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerCommands {
    pub image: Option<PlayerCommand>,
    pub video: Option<PlayerCommand>,
    pub audio: Option<PlayerCommand>,
}

/// Holds the application's configuration parameters.
#[derive(Clone)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub auth_token: Option<String>,
    pub source: SlideshowSource,
    pub image_duration: Duration,
    pub players: PlayerCommands,
}

/// Stands in for a bearer token in log output.
pub fn redacted(token: &Option<String>) -> Option<&'static str> {
    token.as_ref().map(|_| "***")
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("auth_token", &redacted(&self.auth_token))
            .field("source", &self.source)
            .field("image_duration", &self.image_duration)
            .field("players", &self.players)
            .finish()
    }
}

/// Loads application configuration from the specified INI file path.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed,
/// or if essential keys are missing or invalid.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| {
        error!("Error reading config file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let app_config = parse_config(&contents)?;
    info!("Configuration loaded successfully from {}: {:?}", path, app_config);
    Ok(app_config)
}

/// Parses configuration from INI text.
#[must_use = "parsing configuration can fail, the Result must be handled"]
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let mut config_parser = Ini::new();
    config_parser.read(contents.to_string()).map_err(ConfigError::Parse)?;

    // Blank values count as absent.
    let get_optional = |section: &str, key: &str| {
        config_parser
            .get(section, key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let base_url_raw = get_optional("api", "base_url").ok_or_else(|| {
        error!("Missing configuration key 'base_url' in section '[api]'");
        ConfigError::MissingKey("api.base_url".to_string())
    })?;
    let mut api_base_url = Url::parse(&base_url_raw).map_err(|e| ConfigError::InvalidValue {
        key: "api.base_url".to_string(),
        reason: e.to_string(),
    })?;
    // Endpoint paths are joined relative to the base, which needs a trailing slash.
    if !api_base_url.path().ends_with('/') {
        let path = format!("{}/", api_base_url.path());
        api_base_url.set_path(&path);
    }
    debug!("Loaded config value for key 'api.base_url': {}", api_base_url);

    let auth_token = get_optional("api", "auth_token");
    debug!("Auth token configured: {}", auth_token.is_some());

    let source = match (
        get_optional("slideshow", "share_token"),
        get_optional("slideshow", "batch_id"),
    ) {
        (Some(token), None) => SlideshowSource::Shared(token),
        (None, Some(batch_id)) => SlideshowSource::Owned(batch_id),
        (Some(_), Some(_)) => {
            return Err(ConfigError::InvalidValue {
                key: "slideshow".to_string(),
                reason: "set either share_token or batch_id, not both".to_string(),
            })
        }
        (None, None) => return Err(ConfigError::MissingKey("slideshow.share_token".to_string())),
    };
    debug!("Loaded slideshow source: {}", source);

    let image_duration = match get_optional("slideshow", "image_duration_ms") {
        None => DEFAULT_IMAGE_DURATION,
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "slideshow.image_duration_ms".to_string(),
                    reason: format!("expected a positive number of milliseconds, got '{}'", raw),
                })
            }
        },
    };
    debug!("Image display duration: {:?}", image_duration);

    let players = PlayerCommands {
        image: get_optional("players", "image").and_then(|line| PlayerCommand::parse(&line)),
        video: get_optional("players", "video").and_then(|line| PlayerCommand::parse(&line)),
        audio: get_optional("players", "audio").and_then(|line| PlayerCommand::parse(&line)),
    };
    debug!("Player commands: {:?}", players);

    Ok(AppConfig { api_base_url, auth_token, source, image_duration, players })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_shared_slideshow_with_defaults() {
        let cfg = parse_config("[api]\nbase_url = http://localhost:5005\n\n[slideshow]\nshare_token = tok-1\n").unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "http://localhost:5005/");
        assert_eq!(cfg.source, SlideshowSource::Shared("tok-1".into()));
        assert_eq!(cfg.image_duration, DEFAULT_IMAGE_DURATION);
        assert!(cfg.auth_token.is_none());
        assert_eq!(cfg.players, PlayerCommands::default());
    }

    #[test]
    fn parses_owned_slideshow_with_players() {
        let cfg = parse_config(
            "[api]\nbase_url = https://lightbox.example\nauth_token = secret\n\
             [slideshow]\nbatch_id = 42\nimage_duration_ms = 5000\n\
             [players]\nvideo = mpv --really-quiet --fs\naudio =\n",
        )
        .unwrap();
        assert_eq!(cfg.source, SlideshowSource::Owned("42".into()));
        assert_eq!(cfg.auth_token.as_deref(), Some("secret"));
        assert_eq!(cfg.image_duration, Duration::from_millis(5000));
        assert_eq!(
            cfg.players.video,
            Some(PlayerCommand { program: "mpv".into(), args: vec!["--really-quiet".into(), "--fs".into()] })
        );
        assert!(cfg.players.audio.is_none());
    }

    #[test]
    fn debug_output_hides_the_auth_token() {
        let cfg = parse_config(
            "[api]\nbase_url = http://localhost:5005\nauth_token = SUPERSECRET\n[slideshow]\nbatch_id = 42\n",
        )
        .unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("SUPERSECRET"));
        assert!(printed.contains(r#"auth_token: Some("***")"#));
        assert_eq!(cfg.auth_token.as_deref(), Some("SUPERSECRET"));
    }

    #[test]
    fn rejects_ambiguous_or_missing_source() {
        let both = parse_config("[api]\nbase_url = http://h\n[slideshow]\nshare_token = a\nbatch_id = b\n");
        assert!(matches!(both, Err(ConfigError::InvalidValue { .. })));

        let neither = parse_config("[api]\nbase_url = http://h\n");
        assert!(matches!(neither, Err(ConfigError::MissingKey(_))));
    }

    #[test]
    fn base_url_with_path_prefix_gets_trailing_slash() {
        let cfg = parse_config("[api]\nbase_url = https://host/lightbox\n[slideshow]\nshare_token = a\n").unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "https://host/lightbox/");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse_config("[slideshow]\nshare_token = a\n"),
            Err(ConfigError::MissingKey(key)) if key == "api.base_url"
        ));
        assert!(matches!(
            parse_config("[api]\nbase_url = not a url\n[slideshow]\nshare_token = a\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_config("[api]\nbase_url = http://h\n[slideshow]\nshare_token = a\nimage_duration_ms = 0\n"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn loads_from_file_and_reports_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = http://localhost:5005\n[slideshow]\nbatch_id = b-7").unwrap();
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.source, SlideshowSource::Owned("b-7".into()));

        let missing = load_config("/nonexistent/lightbox-slideshow.conf");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
