mod common;

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use focus_core::error::Result;
use focus_core::models::{Ack, ConnectionPhase, FocusCommand, FocusState};
use focus_core::store::FocusStore;
use focus_runtime::monitor::{FocusMonitor, FocusSnapshot, MonitorConfig};
use focus_runtime::notifier::Notifier;

use common::WAIT;

#[derive(Clone, Default)]
struct RecordingNotifier {
    commands: Arc<Mutex<Vec<FocusCommand>>>,
}

impl RecordingNotifier {
    fn recorded(&self) -> Vec<FocusCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, command: FocusCommand) -> impl Future<Output = Result<Ack>> + Send {
        let commands = Arc::clone(&self.commands);
        async move {
            commands.lock().unwrap().push(command);
            Ok(Ack::new("recorded"))
        }
    }
}

async fn wait_for<F>(rx: &mut mpsc::Receiver<FocusSnapshot>, pred: F) -> FocusSnapshot
where
    F: Fn(&FocusSnapshot) -> bool,
{
    timeout(WAIT, async {
        loop {
            let snap = rx.recv().await.expect("monitor stopped");
            if pred(&snap) {
                return snap;
            }
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

fn frame(value: serde_json::Value) -> String {
    value.to_string()
}

fn config(url: String) -> MonitorConfig {
    let mut config = MonitorConfig::new(url);
    config.reconnect_delay = Duration::from_secs(60);
    config.notify_timeout = Duration::from_millis(500);
    config
}

#[tokio::test]
async fn test_pipeline_pauses_and_resumes_in_learning_mode() {
    let dir = TempDir::new().unwrap();
    let (url, frames) = common::scripted_server().await;
    let notifier = RecordingNotifier::default();
    let monitor = FocusMonitor::new(config(url), FocusStore::new(dir.path()), notifier.clone());
    let (mut rx, handle) = monitor.start();

    let initial = wait_for(&mut rx, |_| true).await;
    assert!(!initial.learning_mode);
    wait_for(&mut rx, |s| s.phase == ConnectionPhase::Online).await;

    assert!(handle.set_learning_mode(true).await);
    wait_for(&mut rx, |s| s.learning_mode).await;

    frames
        .send(frame(json!({"concentration": 15, "eeg_status": "Połączono z EEG"})))
        .unwrap();
    let snap = wait_for(&mut rx, |s| s.focus_state == FocusState::Distracted).await;
    assert_eq!(snap.concentration, Some(15.0));
    assert_eq!(snap.eeg_status.as_deref(), Some("Połączono z EEG"));
    assert_eq!(snap.last_command, Some(FocusCommand::Pause));
    assert_eq!(snap.last_delivery.as_deref(), Some("recorded"));
    assert_eq!(notifier.recorded(), vec![FocusCommand::Pause]);

    // Malformed and still-low frames change nothing.
    frames.send("{broken".to_string()).unwrap();
    frames.send(frame(json!([1, 2, 3]))).unwrap();
    frames.send(frame(json!({"concentration": 19.9}))).unwrap();
    wait_for(&mut rx, |s| s.concentration == Some(19.9)).await;
    assert_eq!(notifier.recorded(), vec![FocusCommand::Pause]);

    frames.send(frame(json!({"concentration": 20}))).unwrap();
    let snap = wait_for(&mut rx, |s| s.focus_state == FocusState::Concentrating).await;
    assert_eq!(snap.last_command, Some(FocusCommand::Resume));
    assert_eq!(notifier.recorded(), vec![FocusCommand::Pause, FocusCommand::Resume]);

    handle.shutdown().await;

    let store = FocusStore::new(dir.path());
    assert!(store.learning_mode());
    assert_eq!(store.concentration(), Some(20.0));
}

#[tokio::test]
async fn test_disabling_learning_mode_while_distracted_resumes() {
    let (url, frames) = common::scripted_server().await;
    let notifier = RecordingNotifier::default();
    let mut store = FocusStore::in_memory();
    store.set_learning_mode(true);
    let monitor = FocusMonitor::new(config(url), store, notifier.clone());
    let (mut rx, handle) = monitor.start();

    wait_for(&mut rx, |s| s.phase == ConnectionPhase::Online).await;
    frames.send(frame(json!({"concentration": 5}))).unwrap();
    wait_for(&mut rx, |s| s.focus_state == FocusState::Distracted).await;

    assert!(handle.set_learning_mode(false).await);
    let snap = wait_for(&mut rx, |s| !s.learning_mode).await;
    assert_eq!(snap.focus_state, FocusState::Concentrating);
    assert_eq!(notifier.recorded(), vec![FocusCommand::Pause, FocusCommand::Resume]);

    // With learning mode off, low readings are shown but trigger nothing.
    frames.send(frame(json!({"concentration": 3}))).unwrap();
    let snap = wait_for(&mut rx, |s| s.concentration == Some(3.0)).await;
    assert_eq!(snap.focus_state, FocusState::Concentrating);
    assert_eq!(notifier.recorded().len(), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_toggle_to_current_value_sends_nothing() {
    let url = common::refused_endpoint().await;
    let notifier = RecordingNotifier::default();
    let monitor = FocusMonitor::new(config(url), FocusStore::in_memory(), notifier.clone());
    let (mut rx, handle) = monitor.start();

    wait_for(&mut rx, |_| true).await;
    assert!(handle.set_learning_mode(false).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(notifier.recorded().is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_server_disconnect_clears_status_in_snapshot() {
    let (url, frames) = common::scripted_server().await;
    let monitor = FocusMonitor::new(config(url), FocusStore::in_memory(), RecordingNotifier::default());
    let (mut rx, handle) = monitor.start();

    wait_for(&mut rx, |s| s.phase == ConnectionPhase::Online).await;
    frames.send(frame(json!({"eeg_status": "Połączono z EEG"}))).unwrap();
    wait_for(&mut rx, |s| s.eeg_status.is_some()).await;

    // Dropping the sender ends the server's connection.
    drop(frames);
    let snap = wait_for(&mut rx, |s| s.phase == ConnectionPhase::Disconnected).await;
    assert!(snap.eeg_status.is_none());

    timeout(WAIT, handle.shutdown()).await.expect("shutdown hung");
}
