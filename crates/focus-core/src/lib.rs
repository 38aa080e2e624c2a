//! Core types and decision logic for BrainWave Focus.
//!
//! Holds the data model, frame validation, the focus hysteresis gate, the
//! persisted state store and CLI settings. Nothing in this crate performs
//! network I/O.

pub mod error;
pub mod gate;
pub mod models;
pub mod settings;
pub mod store;
pub mod validator;

pub use error::{FocusError, Result};
pub use gate::{FocusGate, LOW_FOCUS_THRESHOLD};
pub use models::{Ack, ConnectionPhase, DeviceStatus, FocusCommand, FocusState, Reading};
