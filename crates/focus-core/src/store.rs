//! Persisted focus state.
//!
//! Keeps the three values that outlive a single run: the learning-mode flag,
//! the last known concentration and the last known EEG device status. They
//! are stored in `~/.brainwave-focus/state.json`. The store is an accessor
//! style key/value holder; it never interprets the values.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{FocusError, Result};

/// File name of the state document inside the config directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Minimum spacing between writes caused by concentration changes alone.
pub const CONCENTRATION_SAVE_INTERVAL: Duration = Duration::from_secs(5);

/// On-disk shape of the persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub learning_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eeg_status: Option<String>,
}

/// JSON-file backed store for [`PersistedState`].
///
/// The learning-mode flag and the device status write through to disk.
/// Concentration arrives twice a second, so its changes are written at most
/// once per [`CONCENTRATION_SAVE_INTERVAL`]; a newer value held back by the
/// throttle goes out with the next write, on [`FocusStore::flush`], or when
/// the store is dropped. Write failures are logged as warnings; the
/// in-memory value is kept either way.
///
/// # Example
///
/// ```no_run
/// use focus_core::store::FocusStore;
/// use std::path::Path;
///
/// let mut store = FocusStore::new(Path::new("/tmp/brainwave-focus"));
/// store.set_learning_mode(true);
/// assert!(store.learning_mode());
/// ```
#[derive(Debug)]
pub struct FocusStore {
    /// Path to `state.json`; `None` keeps the store in memory only.
    state_file: Option<PathBuf>,
    state: PersistedState,
    /// Memory holds changes the file does not.
    dirty: bool,
    last_saved: Option<Instant>,
    concentration_interval: Duration,
}

impl FocusStore {
    // ── Construction ──────────────────────────────────────────────────────

    /// Open the store rooted at `config_dir`, loading any existing state.
    pub fn new(config_dir: &Path) -> Self {
        let state_file = config_dir.join(STATE_FILE_NAME);
        let state = Self::load_state(&state_file);
        Self {
            state_file: Some(state_file),
            state,
            dirty: false,
            last_saved: None,
            concentration_interval: CONCENTRATION_SAVE_INTERVAL,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            state_file: None,
            state: PersistedState::default(),
            dirty: false,
            last_saved: None,
            concentration_interval: CONCENTRATION_SAVE_INTERVAL,
        }
    }

    /// Override the spacing of concentration-only writes.
    pub fn with_concentration_interval(mut self, interval: Duration) -> Self {
        self.concentration_interval = interval;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn learning_mode(&self) -> bool {
        self.state.learning_mode
    }

    pub fn set_learning_mode(&mut self, enabled: bool) {
        if self.state.learning_mode != enabled {
            self.state.learning_mode = enabled;
            self.persist();
        }
    }

    pub fn concentration(&self) -> Option<f64> {
        self.state.concentration
    }

    /// Update the concentration; the write may be deferred by the throttle.
    pub fn set_concentration(&mut self, value: f64) {
        if self.state.concentration == Some(value) {
            return;
        }
        self.state.concentration = Some(value);
        self.dirty = true;
        let due = self
            .last_saved
            .map_or(true, |at| at.elapsed() >= self.concentration_interval);
        if due {
            self.persist();
        }
    }

    pub fn eeg_status(&self) -> Option<&str> {
        self.state.eeg_status.as_deref()
    }

    pub fn set_eeg_status(&mut self, status: &str) {
        if self.state.eeg_status.as_deref() != Some(status) {
            self.state.eeg_status = Some(status.to_string());
            self.persist();
        }
    }

    pub fn clear_eeg_status(&mut self) {
        if self.state.eeg_status.take().is_some() {
            self.persist();
        }
    }

    /// Snapshot of everything currently held.
    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn path(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    /// Whether a change is still waiting to be written.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Persistence ───────────────────────────────────────────────────────

    /// Write the current state to disk, returning any failure.
    ///
    /// Uses a temp file and rename so readers never see a half-written file.
    pub fn save(&self) -> Result<()> {
        let Some(path) = self.state_file.as_deref() else {
            return Ok(());
        };
        let write_err = |source| FocusError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, path).map_err(write_err)?;
        Ok(())
    }

    /// Write any change held back by the concentration throttle.
    pub fn flush(&mut self) {
        if self.dirty {
            self.persist();
        }
    }

    fn persist(&mut self) {
        self.dirty = true;
        match self.save() {
            Ok(()) => {
                self.dirty = false;
                self.last_saved = Some(Instant::now());
            }
            Err(e) => tracing::warn!(error = %e, "failed to save focus state"),
        }
    }

    fn load_state(path: &Path) -> PersistedState {
        if !path.exists() {
            return PersistedState::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<PersistedState>(&content) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "failed to deserialise focus state; using defaults"
                    );
                    PersistedState::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "failed to read focus state file; using defaults"
                );
                PersistedState::default()
            }
        }
    }
}

impl Drop for FocusStore {
    fn drop(&mut self) {
        self.flush();
    }
}
