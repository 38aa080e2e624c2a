//! Focus monitoring pipeline.
//!
//! [`FocusMonitor`] wires a [`ConnectionManager`] to a [`FocusSession`] and a
//! [`Notifier`] inside one tokio task. Connection callbacks forward into an
//! unbounded channel; the task serialises those events and learning-mode
//! toggles through a single `select!` loop, so the session is never shared.
//! After every event a [`FocusSnapshot`] is sent to the presentation layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use focus_core::error::Result;
use focus_core::gate::FocusGate;
use focus_core::models::{Ack, ConnectionPhase, FocusCommand, FocusState, Reading};
use focus_core::store::FocusStore;

use crate::connection::{
    ConnectionManager, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_IDLE_TIMEOUT, DEFAULT_RECONNECT_DELAY,
};
use crate::notifier::{deliver_with_timeout, Notifier, DEFAULT_NOTIFY_TIMEOUT};

// ── Public types ──────────────────────────────────────────────────────────────

/// State published to the presentation layer after every event.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSnapshot {
    pub phase: ConnectionPhase,
    /// Most recent concentration, shown whether or not learning mode is on.
    pub concentration: Option<f64>,
    pub eeg_status: Option<String>,
    pub learning_mode: bool,
    pub focus_state: FocusState,
    /// Last command handed to the notifier.
    pub last_command: Option<FocusCommand>,
    /// Acknowledgement status or error text for [`FocusSnapshot::last_command`].
    pub last_delivery: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Static configuration of a monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub endpoint: String,
    pub reconnect_delay: Duration,
    pub handshake_timeout: Duration,
    pub idle_timeout: Duration,
    pub notify_timeout: Duration,
}

impl MonitorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

// ── FocusSession ──────────────────────────────────────────────────────────────

/// The one owned state object of the pipeline.
///
/// Holds the persisted store, the focus gate and the live values the UI
/// shows. All methods are synchronous; delivery of the returned commands is
/// the caller's job.
pub struct FocusSession {
    store: FocusStore,
    gate: FocusGate,
    phase: ConnectionPhase,
    concentration: Option<f64>,
    eeg_status: Option<String>,
    last_command: Option<FocusCommand>,
    last_delivery: Option<String>,
}

impl FocusSession {
    /// Build a session from persisted state. The gate starts `Concentrating`
    /// and the phase `Disconnected`.
    pub fn new(store: FocusStore) -> Self {
        let mut gate = FocusGate::new();
        gate.set_learning_mode(store.learning_mode());
        let concentration = store.concentration();
        let eeg_status = store.eeg_status().map(str::to_string);
        Self {
            store,
            gate,
            phase: ConnectionPhase::Disconnected,
            concentration,
            eeg_status,
            last_command: None,
            last_delivery: None,
        }
    }

    /// Apply one validated reading and return the command it triggers.
    pub fn apply_reading(&mut self, reading: Reading) -> Option<FocusCommand> {
        if let Some(status) = reading.device_status.as_deref() {
            self.store.set_eeg_status(status);
            self.eeg_status = Some(status.to_string());
        }

        let value = reading.concentration?;
        self.concentration = Some(value);
        let learning_mode = self.store.learning_mode();
        if learning_mode {
            self.store.set_concentration(value);
        }
        self.gate.update(value, learning_mode)
    }

    /// Record a connection phase change. Also writes out any concentration
    /// held back by the store's throttle.
    pub fn apply_phase(&mut self, phase: ConnectionPhase) {
        self.phase = phase;
        self.store.flush();
        if phase == ConnectionPhase::Disconnected {
            self.eeg_status = None;
            self.store.clear_eeg_status();
        }
    }

    /// Persist a learning-mode toggle and re-evaluate the gate.
    pub fn set_learning_mode(&mut self, enabled: bool) -> Option<FocusCommand> {
        self.store.set_learning_mode(enabled);
        self.gate.set_learning_mode(enabled)
    }

    /// Remember the outcome of a delivery for display.
    pub fn record_delivery(&mut self, command: FocusCommand, outcome: &Result<Ack>) {
        self.last_command = Some(command);
        self.last_delivery = Some(match outcome {
            Ok(ack) => ack.status.clone(),
            Err(e) => e.to_string(),
        });
    }

    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            phase: self.phase,
            concentration: self.concentration,
            eeg_status: self.eeg_status.clone(),
            learning_mode: self.store.learning_mode(),
            focus_state: self.gate.state(),
            last_command: self.last_command,
            last_delivery: self.last_delivery.clone(),
            updated_at: Utc::now(),
        }
    }

    pub fn focus_state(&self) -> FocusState {
        self.gate.state()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn store(&self) -> &FocusStore {
        &self.store
    }

    /// Write pending state to disk.
    pub fn flush(&mut self) {
        self.store.flush();
    }
}

// ── FocusMonitor ──────────────────────────────────────────────────────────────

enum ConnectionEvent {
    Phase(ConnectionPhase),
    Reading(Reading),
}

enum Control {
    SetLearningMode(bool),
    Shutdown,
}

/// Background pipeline coordinator.
///
/// Call [`FocusMonitor::start`] to spawn the pipeline and receive a channel
/// of [`FocusSnapshot`]s plus a [`FocusHandle`] to steer it.
pub struct FocusMonitor<N: Notifier> {
    config: MonitorConfig,
    session: FocusSession,
    notifier: N,
}

impl<N: Notifier> FocusMonitor<N> {
    pub fn new(config: MonitorConfig, store: FocusStore, notifier: N) -> Self {
        Self {
            config,
            session: FocusSession::new(store),
            notifier,
        }
    }

    /// Spawn the pipeline task.
    ///
    /// The first snapshot is sent before the connection is opened.
    pub fn start(self) -> (mpsc::Receiver<FocusSnapshot>, FocusHandle) {
        let (tx, rx) = mpsc::channel(16);
        let (control_tx, control_rx) = mpsc::channel(8);

        let task = tokio::spawn(self.run(tx, control_rx));

        let handle = FocusHandle {
            control: FocusControl { tx: control_tx },
            task,
        };
        (rx, handle)
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn run(mut self, tx: mpsc::Sender<FocusSnapshot>, mut control_rx: mpsc::Receiver<Control>) {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let mut conn = ConnectionManager::new(self.config.endpoint.clone(), self.config.reconnect_delay)
            .with_handshake_timeout(self.config.handshake_timeout)
            .with_idle_timeout(self.config.idle_timeout);
        let phase_tx = event_tx.clone();
        conn.on_phase_change(move |phase| {
            let _ = phase_tx.send(ConnectionEvent::Phase(phase));
        });
        conn.on_reading(move |reading| {
            let _ = event_tx.send(ConnectionEvent::Reading(reading));
        });

        tracing::info!(
            endpoint = %self.config.endpoint,
            learning_mode = self.session.store().learning_mode(),
            "focus monitor starting"
        );
        self.publish(&tx).await;
        conn.connect();

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    let command = match event {
                        ConnectionEvent::Phase(phase) => {
                            self.session.apply_phase(phase);
                            None
                        }
                        ConnectionEvent::Reading(reading) => self.session.apply_reading(reading),
                    };
                    if let Some(command) = command {
                        self.dispatch(command).await;
                    }
                }
                control = control_rx.recv() => match control {
                    Some(Control::SetLearningMode(enabled)) => {
                        tracing::info!(enabled, "learning mode toggled");
                        if let Some(command) = self.session.set_learning_mode(enabled) {
                            self.dispatch(command).await;
                        }
                    }
                    Some(Control::Shutdown) | None => break,
                },
            }

            self.publish(&tx).await;
        }

        conn.shutdown().await;
        self.session.flush();
        tracing::info!("focus monitor stopped");
    }

    async fn dispatch(&mut self, command: FocusCommand) {
        let outcome = deliver_with_timeout(&self.notifier, command, self.config.notify_timeout).await;
        match &outcome {
            Ok(ack) => tracing::info!(command = %command, status = %ack.status, "notifier acknowledged"),
            Err(e) => tracing::warn!(command = %command, error = %e, "notifier failed"),
        }
        self.session.record_delivery(command, &outcome);
    }

    async fn publish(&self, tx: &mpsc::Sender<FocusSnapshot>) {
        if tx.is_closed() {
            return;
        }
        if let Err(e) = tx.send(self.session.snapshot()).await {
            tracing::debug!(error = %e, "snapshot receiver dropped");
        }
    }
}

// ── FocusHandle / FocusControl ────────────────────────────────────────────────

/// Cloneable sender for steering a running monitor.
#[derive(Clone)]
pub struct FocusControl {
    tx: mpsc::Sender<Control>,
}

impl FocusControl {
    /// Ask the monitor to switch learning mode. Returns `false` when the
    /// monitor has already stopped.
    pub async fn set_learning_mode(&self, enabled: bool) -> bool {
        self.tx.send(Control::SetLearningMode(enabled)).await.is_ok()
    }
}

/// Owner handle of a running monitor task.
pub struct FocusHandle {
    control: FocusControl,
    task: tokio::task::JoinHandle<()>,
}

impl FocusHandle {
    pub fn control(&self) -> FocusControl {
        self.control.clone()
    }

    pub async fn set_learning_mode(&self, enabled: bool) -> bool {
        self.control.set_learning_mode(enabled).await
    }

    /// Stop the pipeline: the connection is closed with a normal-closure
    /// frame and the task is awaited.
    pub async fn shutdown(self) {
        // A send error means the task already ended.
        let _ = self.control.tx.send(Control::Shutdown).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "focus monitor task ended abnormally");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
