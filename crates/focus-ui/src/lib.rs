//! Terminal status panel for BrainWave Focus.
//!
//! Provides themes, the header, gauge and indicator components, the status
//! view, and the application event loop built on [`ratatui`].

pub mod app;
pub mod components;
pub mod status_view;
pub mod themes;

pub use focus_core as core;
