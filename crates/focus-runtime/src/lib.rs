//! Async side of BrainWave Focus: the WebSocket connection manager, command
//! notifiers and the monitor task that joins them.

pub mod connection;
pub mod monitor;
pub mod notifier;

pub use focus_core as core;

pub use connection::ConnectionManager;
pub use monitor::{FocusControl, FocusHandle, FocusMonitor, FocusSession, FocusSnapshot, MonitorConfig};
pub use notifier::{CommandNotifier, LogNotifier, Notifier};
