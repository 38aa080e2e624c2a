//! Application state and TUI event loop for the status panel.
//!
//! [`App`] owns the theme and the last received [`FocusSnapshot`]. Keys are
//! turned into [`Action`]s; learning-mode toggles go back to the monitor
//! through a [`FocusControl`].

use std::io;
use std::time::Duration;

use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tokio::sync::mpsc;

use focus_runtime::monitor::{FocusControl, FocusSnapshot};

use crate::status_view;
use crate::themes::Theme;

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleLearningMode,
    Quit,
}

/// Map a key event to an [`Action`].
pub fn action_for(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Char(' ') => {
            Some(Action::ToggleLearningMode)
        }
        _ => None,
    }
}

// ── Terminal guard ────────────────────────────────────────────────────────────

/// Runs `restore` exactly once when dropped.
///
/// [`App::run`] holds one for the lifetime of the raw-mode session, so the
/// terminal is restored on every exit path, including the future being
/// dropped mid-await.
pub struct TerminalGuard<F: FnMut()> {
    restore: Option<F>,
}

impl<F: FnMut()> TerminalGuard<F> {
    pub fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        if let Some(mut restore) = self.restore.take() {
            restore();
        }
    }
}

/// Leave raw mode and the alternate screen, ignoring failures.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen, Show);
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub theme: Theme,
    /// Endpoint shown in the header.
    pub endpoint: String,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// `None` until the first snapshot arrives.
    pub last_snapshot: Option<FocusSnapshot>,
}

impl App {
    pub fn new(theme_name: &str, endpoint: impl Into<String>) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            endpoint: endpoint.into(),
            should_quit: false,
            last_snapshot: None,
        }
    }

    /// Run the panel until the user quits or the monitor stops.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the terminal
    /// loop stays on this task while snapshots arrive on `rx` via `try_recv`.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<FocusSnapshot>,
        control: FocusControl,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        let _guard = TerminalGuard::new(restore_terminal);
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        loop {
            terminal.draw(|frame| self.render(frame))?;

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => match action_for(key) {
                        Some(Action::Quit) => return Ok(()),
                        Some(Action::ToggleLearningMode) => {
                            let enabled = self.next_learning_mode();
                            if !control.set_learning_mode(enabled).await {
                                self.should_quit = true;
                            }
                        }
                        None => {}
                    },
                    Ok(_) => {}
                    Err(e) => return Err(e),
                },
                Ok(false) => {}
                Err(e) => return Err(e),
            }

            // Drain pending snapshots (non-blocking).
            loop {
                match rx.try_recv() {
                    Ok(snapshot) => self.update(snapshot),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.should_quit = true;
                        break;
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    /// Store the latest snapshot.
    pub fn update(&mut self, snapshot: FocusSnapshot) {
        self.last_snapshot = Some(snapshot);
    }

    /// Learning-mode value a toggle should request.
    pub fn next_learning_mode(&self) -> bool {
        !self
            .last_snapshot
            .as_ref()
            .map(|s| s.learning_mode)
            .unwrap_or(false)
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        match &self.last_snapshot {
            Some(snapshot) => {
                status_view::render_status_view(frame, area, &self.endpoint, snapshot, &self.theme)
            }
            None => status_view::render_waiting(frame, area, &self.theme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crossterm::event::KeyEventState;
    use focus_core::models::{ConnectionPhase, FocusState};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn snapshot(learning_mode: bool) -> FocusSnapshot {
        FocusSnapshot {
            phase: ConnectionPhase::Online,
            concentration: Some(72.0),
            eeg_status: None,
            learning_mode,
            focus_state: FocusState::Concentrating,
            last_command: None,
            last_delivery: None,
            updated_at: Utc::now(),
        }
    }

    // ── Key mapping ───────────────────────────────────────────────────────────

    #[test]
    fn test_action_for_quit_keys() {
        assert_eq!(action_for(key(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Action::Quit));
        assert_eq!(action_for(key(KeyCode::Esc, KeyModifiers::NONE)), Some(Action::Quit));
        assert_eq!(
            action_for(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_action_for_toggle_keys() {
        assert_eq!(
            action_for(key(KeyCode::Char('l'), KeyModifiers::NONE)),
            Some(Action::ToggleLearningMode)
        );
        assert_eq!(
            action_for(key(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(Action::ToggleLearningMode)
        );
        assert_eq!(action_for(key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_action_for_ignores_release() {
        let mut release = key(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(action_for(release), None);
    }

    // ── Terminal guard ────────────────────────────────────────────────────────

    #[test]
    fn test_terminal_guard_restores_once_on_drop() {
        use std::cell::Cell;

        let calls = Cell::new(0);
        {
            let _guard = TerminalGuard::new(|| calls.set(calls.get() + 1));
            assert_eq!(calls.get(), 0);
        }
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_terminal_guard_restores_when_future_is_dropped() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let restored = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&restored);
        let session = async move {
            let _guard = TerminalGuard::new(move || flag.store(true, Ordering::SeqCst));
            std::future::pending::<()>().await;
        };

        // Same shape as the binary's select! between the panel and Ctrl+C.
        tokio::select! {
            _ = session => unreachable!("pending future completed"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        assert!(restored.load(Ordering::SeqCst));
    }

    // ── State ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_next_learning_mode_flips_last_snapshot() {
        let mut app = App::new("dark", "ws://x");
        assert!(app.next_learning_mode());

        app.update(snapshot(true));
        assert!(!app.next_learning_mode());

        app.update(snapshot(false));
        assert!(app.next_learning_mode());
    }

    #[test]
    fn test_render_before_and_after_first_snapshot() {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        let mut app = App::new("classic", "ws://127.0.0.1:8000/ws/focus");

        terminal.draw(|frame| app.render(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Starting focus monitor"));

        app.update(snapshot(true));
        terminal.draw(|frame| app.render(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Focus OK"));
    }
}
