//! Two-state hysteresis gate turning concentration readings into focus
//! transitions.
//!
//! The gate emits a [`FocusCommand`] only on an edge crossing: a run of
//! readings on the same side of [`LOW_FOCUS_THRESHOLD`] produces at most one
//! command. While learning mode is off the gate is pinned to
//! [`FocusState::Concentrating`].

use crate::models::{FocusCommand, FocusState};

/// Concentration (percent) below which the user counts as distracted.
/// A value exactly at the threshold counts as concentrating.
pub const LOW_FOCUS_THRESHOLD: f64 = 20.0;

/// Hysteresis state machine for the focus decision.
#[derive(Debug, Clone)]
pub struct FocusGate {
    state: FocusState,
    learning_mode: bool,
    /// Last concentration seen while learning mode was on.
    last_concentration: Option<f64>,
}

impl FocusGate {
    /// Create a gate in the initial `Concentrating` state with learning mode
    /// off.
    pub fn new() -> Self {
        Self {
            state: FocusState::Concentrating,
            learning_mode: false,
            last_concentration: None,
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Feed one validated concentration reading.
    ///
    /// `learning_mode` is the current value of the externally owned flag; a
    /// change in it is handled exactly as [`FocusGate::set_learning_mode`]
    /// would, so a disabled flag while distracted forces a `Resume`.
    pub fn update(&mut self, concentration: f64, learning_mode: bool) -> Option<FocusCommand> {
        if !learning_mode {
            return self.set_learning_mode(false);
        }
        self.learning_mode = true;
        self.last_concentration = Some(concentration);

        let below = concentration < LOW_FOCUS_THRESHOLD;
        match (self.state, below) {
            (FocusState::Concentrating, true) => {
                self.state = FocusState::Distracted;
                tracing::info!(concentration, "focus low, pausing");
                Some(FocusCommand::Pause)
            }
            (FocusState::Distracted, false) => {
                self.state = FocusState::Concentrating;
                tracing::info!(concentration, "focus recovered, resuming");
                Some(FocusCommand::Resume)
            }
            _ => None,
        }
    }

    /// Apply an external learning-mode toggle.
    ///
    /// Disabling while `Distracted` forces recovery and returns `Resume`;
    /// every other toggle returns `None`. Enabling does not evaluate the last
    /// value; the next reading decides.
    pub fn set_learning_mode(&mut self, enabled: bool) -> Option<FocusCommand> {
        self.learning_mode = enabled;
        if enabled || self.state == FocusState::Concentrating {
            return None;
        }
        self.state = FocusState::Concentrating;
        tracing::info!("learning mode off while distracted, forcing resume");
        Some(FocusCommand::Resume)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn learning_mode(&self) -> bool {
        self.learning_mode
    }

    pub fn last_concentration(&self) -> Option<f64> {
        self.last_concentration
    }

    pub fn is_concentrating(&self) -> bool {
        self.state == FocusState::Concentrating
    }
}

impl Default for FocusGate {
    fn default() -> Self {
        Self::new()
    }
}
