use crate::themes::Theme;
use focus_core::models::{ConnectionPhase, DeviceStatus, FocusState};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

// ── StatusIndicator ──────────────────────────────────────────────────────────

/// Connection and headset status line.
///
/// The service link takes priority: while it is not online the headset
/// status is stale and not shown.
///
/// | Phase        | Device status | Colour  |
/// |--------------|---------------|---------|
/// | Disconnected | -             | error   |
/// | Connecting   | -             | pending |
/// | Online       | Connected     | success |
/// | Online       | Connecting    | pending |
/// | Online       | Error         | error   |
/// | Online       | anything else | dim     |
pub struct StatusIndicator<'a> {
    pub phase: ConnectionPhase,
    pub eeg_status: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> StatusIndicator<'a> {
    pub fn new(phase: ConnectionPhase, eeg_status: Option<&'a str>, theme: &'a Theme) -> Self {
        Self {
            phase,
            eeg_status,
            theme,
        }
    }

    /// Text and style for the current state.
    pub fn describe(&self) -> (String, Style) {
        match self.phase {
            ConnectionPhase::Disconnected => (
                "❌ No connection to the analysis service. Is it running?".to_string(),
                self.theme.error,
            ),
            ConnectionPhase::Connecting => (
                "🟡 Connecting to the analysis service...".to_string(),
                self.theme.pending,
            ),
            ConnectionPhase::Online => self.describe_device(),
        }
    }

    fn describe_device(&self) -> (String, Style) {
        let Some(raw) = self.eeg_status else {
            return (
                "💤 EEG: waiting for headset status".to_string(),
                self.theme.dim,
            );
        };
        match DeviceStatus::classify(raw) {
            DeviceStatus::Connected => (
                "✅ EEG: active and measuring concentration".to_string(),
                self.theme.success,
            ),
            DeviceStatus::Connecting => (
                "🟡 EEG: connecting to the headset...".to_string(),
                self.theme.pending,
            ),
            DeviceStatus::Error(detail) => (
                format!(
                    "❌ EEG: error - {}",
                    detail.as_deref().unwrap_or("check the analysis service log")
                ),
                self.theme.error,
            ),
            DeviceStatus::Inactive | DeviceStatus::Disconnected | DeviceStatus::Other(_) => (
                format!("💤 EEG: {raw}. Analyzer running in the background."),
                self.theme.dim,
            ),
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let (text, style) = self.describe();
        Line::from(Span::styled(text, style))
    }
}

// ── WarningIndicator ─────────────────────────────────────────────────────────

/// Low-focus warning, or a hint when monitoring is off.
pub struct WarningIndicator<'a> {
    pub learning_mode: bool,
    pub focus_state: FocusState,
    pub theme: &'a Theme,
}

impl<'a> WarningIndicator<'a> {
    pub fn new(learning_mode: bool, focus_state: FocusState, theme: &'a Theme) -> Self {
        Self {
            learning_mode,
            focus_state,
            theme,
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        if !self.learning_mode {
            return Line::from(Span::styled(
                "Enable learning mode to start focus monitoring.",
                self.theme.dim,
            ));
        }
        match self.focus_state {
            FocusState::Distracted => Line::from(Span::styled(
                "⚠️  LOW FOCUS! Playback paused.",
                self.theme.alert,
            )),
            FocusState::Concentrating => {
                Line::from(Span::styled("👍 Focus OK", self.theme.success))
            }
        }
    }
}

// ── LearningModeIndicator ────────────────────────────────────────────────────

/// `📚 Learning mode: ON` with a key hint.
pub struct LearningModeIndicator<'a> {
    pub enabled: bool,
    pub theme: &'a Theme,
}

impl<'a> LearningModeIndicator<'a> {
    pub fn new(enabled: bool, theme: &'a Theme) -> Self {
        Self { enabled, theme }
    }

    pub fn to_line(&self) -> Line<'a> {
        let (state, style) = if self.enabled {
            ("ON", self.theme.learning_on)
        } else {
            ("OFF", self.theme.learning_off)
        };
        Line::from(vec![
            Span::styled("📚 Learning mode: ", self.theme.label),
            Span::styled(state, style),
            Span::styled("   [l] toggle  [q] quit", self.theme.dim),
        ])
    }
}
