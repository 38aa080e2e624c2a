mod bootstrap;

use std::future::Future;

use anyhow::Result;
use tokio::sync::mpsc;

use focus_core::error::Result as FocusResult;
use focus_core::models::{Ack, FocusCommand};
use focus_core::settings::Settings;
use focus_core::store::FocusStore;
use focus_runtime::monitor::{FocusMonitor, FocusSnapshot, MonitorConfig};
use focus_runtime::notifier::{CommandNotifier, LogNotifier, Notifier};
use focus_ui::app::App;

/// Notifier chosen from the command line: shell hooks when any is
/// configured, otherwise log-only.
enum SelectedNotifier {
    Log(LogNotifier),
    Command(CommandNotifier),
}

impl SelectedNotifier {
    fn from_settings(settings: &Settings) -> Self {
        let hooks = CommandNotifier::new(settings.on_pause.clone(), settings.on_resume.clone());
        if hooks.is_empty() {
            SelectedNotifier::Log(LogNotifier)
        } else {
            SelectedNotifier::Command(hooks)
        }
    }
}

impl Notifier for SelectedNotifier {
    fn deliver(&self, command: FocusCommand) -> impl Future<Output = FocusResult<Ack>> + Send {
        async move {
            match self {
                SelectedNotifier::Log(n) => n.deliver(command).await,
                SelectedNotifier::Command(n) => n.deliver(command).await,
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let config_dir = bootstrap::ensure_directories()?;
    // The panel owns the terminal, so logs go to a file unless headless.
    let log_file = match (&settings.log_file, settings.headless) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => None,
        (None, false) => Some(bootstrap::default_log_file(&config_dir)),
    };
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("BrainWave Focus v{} starting", env!("CARGO_PKG_VERSION"));

    let endpoint = settings.endpoint_url()?;
    tracing::info!(
        endpoint = %endpoint,
        reconnect_delay_secs = settings.reconnect_delay,
        notify_timeout_ms = settings.notify_timeout_ms,
        headless = settings.headless,
        "configuration loaded"
    );

    let mut store = FocusStore::new(&config_dir);
    if let Some(enabled) = settings.learning_mode_override() {
        store.set_learning_mode(enabled);
    }

    let mut config = MonitorConfig::new(settings.endpoint.clone());
    config.reconnect_delay = settings.reconnect_delay();
    config.notify_timeout = settings.notify_timeout();
    let notifier = SelectedNotifier::from_settings(&settings);
    let (rx, handle) = FocusMonitor::new(config, store, notifier).start();

    let outcome = if settings.headless {
        run_headless(rx).await;
        Ok(())
    } else {
        let app = App::new(&settings.theme, settings.endpoint.clone());
        // Ctrl+C is also caught at the OS level for signals that arrive
        // outside raw mode. Dropping the panel future restores the terminal.
        tokio::select! {
            result = app.run(rx, handle.control()) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received");
                Ok(())
            }
        }
    };

    tracing::info!("shutting down");
    handle.shutdown().await;
    outcome?;
    Ok(())
}

/// Log snapshots until Ctrl+C or the monitor stops.
async fn run_headless(mut rx: mpsc::Receiver<FocusSnapshot>) {
    let mut last: Option<FocusSnapshot> = None;
    loop {
        tokio::select! {
            snapshot = rx.recv() => {
                let Some(snapshot) = snapshot else { break };
                log_snapshot(last.as_ref(), &snapshot);
                last = Some(snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received");
                break;
            }
        }
    }
}

fn log_snapshot(previous: Option<&FocusSnapshot>, snapshot: &FocusSnapshot) {
    let changed = previous.map_or(true, |p| {
        p.phase != snapshot.phase
            || p.eeg_status != snapshot.eeg_status
            || p.learning_mode != snapshot.learning_mode
            || p.focus_state != snapshot.focus_state
    });
    if changed {
        tracing::info!(
            phase = %snapshot.phase,
            eeg_status = snapshot.eeg_status.as_deref().unwrap_or("-"),
            learning_mode = snapshot.learning_mode,
            focus_state = %snapshot.focus_state,
            "status"
        );
    } else {
        tracing::debug!(concentration = ?snapshot.concentration, "reading");
    }
}
