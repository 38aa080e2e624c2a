use std::fmt;

use serde::{Deserialize, Serialize};

// ── ConnectionPhase ───────────────────────────────────────────────────────────

/// Lifecycle phase of the link to the concentration-data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionPhase {
    /// No socket is open; a reconnect may be pending.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The socket is open and readings may arrive.
    Online,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPhase::Disconnected => "DISCONNECTED",
            ConnectionPhase::Connecting => "CONNECTING",
            ConnectionPhase::Online => "ONLINE",
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── FocusState ────────────────────────────────────────────────────────────────

/// Whether the user is currently considered focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusState {
    #[default]
    Concentrating,
    Distracted,
}

impl fmt::Display for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusState::Concentrating => f.write_str("CONCENTRATING"),
            FocusState::Distracted => f.write_str("DISTRACTED"),
        }
    }
}

// ── FocusCommand ──────────────────────────────────────────────────────────────

/// Command sent to the notifier on a focus transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusCommand {
    /// Concentration fell below the threshold: pause media, show the overlay.
    Pause,
    /// Concentration recovered (or learning mode was switched off).
    Resume,
}

impl FocusCommand {
    /// Symbolic name used on the notifier boundary (`"PAUSE"` / `"RESUME"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusCommand::Pause => "PAUSE",
            FocusCommand::Resume => "RESUME",
        }
    }
}

impl fmt::Display for FocusCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement returned by a notifier after acting on a [`FocusCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Free-form status reported by the notifier (e.g. `"paused"`).
    pub status: String,
}

impl Ack {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// One validated update from the EEG analysis service.
///
/// Either portion may be absent; the validator never produces a reading with
/// both portions missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Concentration percentage, clamped to `[0, 100]`.
    pub concentration: Option<f64>,
    /// Raw device status string as sent by the service.
    pub device_status: Option<String>,
}

// ── DeviceStatus ──────────────────────────────────────────────────────────────

/// Classified EEG headset status.
///
/// The analysis service reports free-form strings (Polish in the reference
/// server, English in others); [`DeviceStatus::classify`] maps both onto a
/// small set of states the presentation layer can colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    Inactive,
    Connecting,
    Connected,
    /// Connection error, with the detail after the first `:` if any.
    Error(Option<String>),
    Disconnected,
    Other(String),
}

impl DeviceStatus {
    /// Classify a raw status string.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();

        // Error messages may embed other keywords in the detail, check first.
        if lower.contains("błąd") || lower.contains("error") {
            let detail = raw
                .split_once(':')
                .map(|(_, d)| d.trim().to_string())
                .filter(|d| !d.is_empty());
            return DeviceStatus::Error(detail);
        }
        if lower.contains("połączono") || lower == "connected" || lower.contains("connected to")
        {
            return DeviceStatus::Connected;
        }
        if lower.contains("łączenie") || lower.contains("connecting") {
            return DeviceStatus::Connecting;
        }
        if lower.contains("rozłączono") || lower.contains("disconnected") {
            return DeviceStatus::Disconnected;
        }
        if lower.contains("nieaktywny") || lower.contains("inactive") {
            return DeviceStatus::Inactive;
        }
        DeviceStatus::Other(raw.to_string())
    }

    /// `true` when the headset is delivering measurements.
    pub fn is_measuring(&self) -> bool {
        matches!(self, DeviceStatus::Connected)
    }
}
