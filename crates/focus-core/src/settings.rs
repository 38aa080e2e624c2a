use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FocusError, Result};

/// Address of the reference EEG analysis server.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/ws/focus";

/// Name of the per-user config directory under `$HOME`.
pub const CONFIG_DIR_NAME: &str = ".brainwave-focus";

/// Return `~/.brainwave-focus`, falling back to `./.brainwave-focus`.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Pause media when EEG-measured concentration drops
#[derive(Parser, Debug, Clone)]
#[command(
    name = "brainwave-focus",
    about = "Pause media when EEG-measured concentration drops",
    version
)]
pub struct Settings {
    /// WebSocket endpoint of the EEG analysis service
    #[arg(long, env = "BRAINWAVE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Seconds to wait before reconnecting after the connection drops (1-300)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub reconnect_delay: u64,

    /// Milliseconds to wait for the notifier to acknowledge a command
    #[arg(long, default_value = "2000", value_parser = clap::value_parser!(u64).range(1..))]
    pub notify_timeout_ms: u64,

    /// Shell command run when focus drops (receives BRAINWAVE_ACTION=PAUSE)
    #[arg(long, env = "BRAINWAVE_ON_PAUSE")]
    pub on_pause: Option<String>,

    /// Shell command run when focus recovers (receives BRAINWAVE_ACTION=RESUME)
    #[arg(long, env = "BRAINWAVE_ON_RESUME")]
    pub on_resume: Option<String>,

    /// Override the persisted learning-mode flag for this run
    #[arg(long, value_parser = ["on", "off"])]
    pub learning_mode: Option<String>,

    /// Run without the terminal status panel, logging to stderr
    #[arg(long)]
    pub headless: bool,

    /// Status panel colour theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.brainwave-focus/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_pause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_DIR_NAME).join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation, taking args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear saved configuration");
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);
        let saved_endpoint = last.endpoint.filter(|v| match validate_endpoint(v) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring saved endpoint");
                false
            }
        });

        // CLI and environment always win over persisted values.
        if !is_arg_explicitly_set(&matches, "endpoint") {
            if let Some(v) = saved_endpoint.clone() {
                settings.endpoint = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "reconnect_delay") {
            if let Some(v) = last.reconnect_delay.filter(|v| (1..=300).contains(v)) {
                settings.reconnect_delay = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "notify_timeout_ms") {
            if let Some(v) = last.notify_timeout_ms.filter(|v| *v > 0) {
                settings.notify_timeout_ms = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "on_pause") && settings.on_pause.is_none() {
            settings.on_pause = last.on_pause;
        }
        if !is_arg_explicitly_set(&matches, "on_resume") && settings.on_resume.is_none() {
            settings.on_resume = last.on_resume;
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last
                .theme
                .filter(|v| matches!(v.as_str(), "light" | "dark" | "classic" | "auto"))
            {
                settings.theme = v;
            }
        }

        settings = Self::apply_debug(settings);

        let mut params = LastUsedParams::from(&settings);
        // An endpoint that fails validation is never remembered; the run
        // still reports it, and the previous good one stays on file.
        if validate_endpoint(&settings.endpoint).is_err() {
            params.endpoint = saved_endpoint;
        }
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!(error = %e, "failed to persist last-used parameters");
        }

        settings
    }

    /// Validate [`Settings::endpoint`] as a `ws://` URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        validate_endpoint(&self.endpoint)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    /// `Some(flag)` when `--learning-mode` was given.
    pub fn learning_mode_override(&self) -> Option<bool> {
        self.learning_mode.as_deref().map(|v| v == "on")
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

/// Parse `raw` and require the plain `ws` scheme and a host.
///
/// The analysis service runs on the local machine and speaks unencrypted
/// WebSocket; `wss` is refused rather than failing on every reconnect.
pub fn validate_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| FocusError::InvalidEndpoint(format!("{raw}: {e}")))?;
    if url.scheme() != "ws" {
        return Err(FocusError::InvalidEndpoint(format!(
            "{raw}: unsupported scheme '{}', expected ws",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(FocusError::InvalidEndpoint(format!("{raw}: missing host")));
    }
    Ok(url)
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            endpoint: Some(s.endpoint.clone()),
            reconnect_delay: Some(s.reconnect_delay),
            notify_timeout_ms: Some(s.notify_timeout_ms),
            on_pause: s.on_pause.clone(),
            on_resume: s.on_resume.clone(),
            theme: Some(s.theme.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied on the command line or through
/// its environment variable (not via a default value).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
