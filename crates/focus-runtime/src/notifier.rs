//! Delivery of focus commands to whatever acts on them.
//!
//! A [`Notifier`] receives a [`FocusCommand`] and answers with an [`Ack`] or
//! an error. Picking the target (a media player, a document viewer) is the
//! notifier's business; the monitor only knows the command and the answer.
//! [`deliver_with_timeout`] bounds the wait.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;

use focus_core::error::{FocusError, Result};
use focus_core::models::{Ack, FocusCommand};

/// Environment variable carrying the command name into shell hooks.
pub const ACTION_ENV_VAR: &str = "BRAINWAVE_ACTION";

/// Default bound on a single delivery.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Receiver of PAUSE / RESUME commands.
pub trait Notifier: Send + Sync + 'static {
    /// Act on `command` and report the outcome.
    fn deliver(&self, command: FocusCommand) -> impl Future<Output = Result<Ack>> + Send;
}

/// Deliver `command`, turning an overrun of `timeout` into
/// [`FocusError::NotifyTimeout`].
pub async fn deliver_with_timeout<N: Notifier>(
    notifier: &N,
    command: FocusCommand,
    timeout: Duration,
) -> Result<Ack> {
    match tokio::time::timeout(timeout, notifier.deliver(command)).await {
        Ok(result) => result,
        Err(_) => Err(FocusError::NotifyTimeout {
            command: command.as_str().to_string(),
            timeout,
        }),
    }
}

// ── LogNotifier ───────────────────────────────────────────────────────────────

/// Notifier that only records the command in the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, command: FocusCommand) -> impl Future<Output = Result<Ack>> + Send {
        async move {
            tracing::info!(command = %command, "focus command");
            Ok(Ack::new("logged"))
        }
    }
}

// ── CommandNotifier ───────────────────────────────────────────────────────────

/// Notifier that runs a user-supplied shell hook per command.
///
/// Hooks run through `sh -c` with [`ACTION_ENV_VAR`] set to `PAUSE` or
/// `RESUME`. A command without a hook is acknowledged as `"ignored"`.
#[derive(Debug, Clone, Default)]
pub struct CommandNotifier {
    on_pause: Option<String>,
    on_resume: Option<String>,
}

impl CommandNotifier {
    pub fn new(on_pause: Option<String>, on_resume: Option<String>) -> Self {
        Self {
            on_pause,
            on_resume,
        }
    }

    /// `true` when neither hook is configured.
    pub fn is_empty(&self) -> bool {
        self.on_pause.is_none() && self.on_resume.is_none()
    }

    fn hook_for(&self, command: FocusCommand) -> Option<&str> {
        match command {
            FocusCommand::Pause => self.on_pause.as_deref(),
            FocusCommand::Resume => self.on_resume.as_deref(),
        }
    }
}

impl Notifier for CommandNotifier {
    fn deliver(&self, command: FocusCommand) -> impl Future<Output = Result<Ack>> + Send {
        let hook = self.hook_for(command).map(str::to_string);
        async move {
            let Some(hook) = hook else {
                tracing::debug!(command = %command, "no hook configured");
                return Ok(Ack::new("ignored"));
            };

            // kill_on_drop so a timed-out hook does not linger.
            let output = Command::new("sh")
                .arg("-c")
                .arg(&hook)
                .env(ACTION_ENV_VAR, command.as_str())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| FocusError::Notify {
                    command: command.as_str().to_string(),
                    reason: format!("failed to spawn hook: {e}"),
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(FocusError::Notify {
                    command: command.as_str().to_string(),
                    reason: format!("hook exited with {}: {}", output.status, stderr.trim()),
                });
            }

            let status = match command {
                FocusCommand::Pause => "paused",
                FocusCommand::Resume => "resumed",
            };
            Ok(Ack::new(status))
        }
    }
}
