//! The status panel screen.
//!
//! Shows the header, connection/headset status, the concentration gauge,
//! the low-focus warning, the learning-mode switch and the last command sent
//! to the notifier.

use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use focus_runtime::monitor::FocusSnapshot;

use crate::components::{
    ConcentrationGauge, Header, LearningModeIndicator, StatusIndicator, WarningIndicator,
};
use crate::themes::Theme;

/// Render the panel for `snapshot` into `area`.
pub fn render_status_view(
    frame: &mut Frame,
    area: Rect,
    endpoint: &str,
    snapshot: &FocusSnapshot,
    theme: &Theme,
) {
    let lines = build_status_lines(endpoint, snapshot, theme);
    let paragraph = Paragraph::new(Text::from(lines));
    frame.render_widget(paragraph, area);
}

/// Build the panel lines (extracted for testability).
pub fn build_status_lines<'a>(
    endpoint: &'a str,
    snapshot: &'a FocusSnapshot,
    theme: &'a Theme,
) -> Vec<Line<'a>> {
    let mut lines = Header::new(endpoint, theme).to_lines();

    lines.push(StatusIndicator::new(snapshot.phase, snapshot.eeg_status.as_deref(), theme).to_line());
    lines.push(Line::from(""));
    lines.push(ConcentrationGauge::new(snapshot.concentration, theme).to_line());
    lines.push(Line::from(""));
    lines.push(WarningIndicator::new(snapshot.learning_mode, snapshot.focus_state, theme).to_line());
    lines.push(Line::from(""));
    lines.push(LearningModeIndicator::new(snapshot.learning_mode, theme).to_line());

    if let Some(command) = snapshot.last_command {
        let outcome = snapshot.last_delivery.as_deref().unwrap_or("pending");
        lines.push(Line::from(vec![
            Span::styled("📨 Last command: ", theme.label),
            Span::styled(command.as_str(), theme.value),
            Span::styled(format!(" ({outcome})"), theme.dim),
        ]));
    }

    lines.push(Line::from(Span::styled(
        format!("Updated {}", snapshot.updated_at.format("%H:%M:%S UTC")),
        theme.dim,
    )));
    lines
}

/// Waiting screen shown before the first snapshot arrives.
pub fn render_waiting(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Starting focus monitor...", theme.info)),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    let paragraph = Paragraph::new(Text::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" BrainWave Focus "),
    );
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use focus_core::models::{ConnectionPhase, FocusCommand, FocusState};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn snapshot() -> FocusSnapshot {
        FocusSnapshot {
            phase: ConnectionPhase::Online,
            concentration: Some(15.0),
            eeg_status: Some("Połączono z EEG".to_string()),
            learning_mode: true,
            focus_state: FocusState::Distracted,
            last_command: Some(FocusCommand::Pause),
            last_delivery: Some("paused".to_string()),
            updated_at: Utc::now(),
        }
    }

    fn all_text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Lines ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_lines_contain_every_section() {
        let theme = Theme::dark();
        let snap = snapshot();
        let text = all_text(&build_status_lines("ws://127.0.0.1:8000/ws/focus", &snap, &theme));

        assert!(text.contains("BRAINWAVE FOCUS"));
        assert!(text.contains("ws://127.0.0.1:8000/ws/focus"));
        assert!(text.contains("measuring concentration"));
        assert!(text.contains("15 %"));
        assert!(text.contains("LOW FOCUS"));
        assert!(text.contains("Learning mode: ON"));
        assert!(text.contains("Last command: PAUSE (paused)"));
    }

    #[test]
    fn test_lines_without_command_skip_command_row() {
        let theme = Theme::dark();
        let mut snap = snapshot();
        snap.last_command = None;
        snap.last_delivery = None;
        let text = all_text(&build_status_lines("ws://x", &snap, &theme));
        assert!(!text.contains("Last command"));
    }

    #[test]
    fn test_lines_disconnected_learning_off() {
        let theme = Theme::dark();
        let snap = FocusSnapshot {
            phase: ConnectionPhase::Disconnected,
            concentration: None,
            eeg_status: None,
            learning_mode: false,
            focus_state: FocusState::Concentrating,
            last_command: None,
            last_delivery: None,
            updated_at: Utc::now(),
        };
        let text = all_text(&build_status_lines("ws://x", &snap, &theme));
        assert!(text.contains("No connection"));
        assert!(text.contains("-- %"));
        assert!(text.contains("Enable learning mode"));
        assert!(text.contains("Learning mode: OFF"));
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_status_view_draws_panel() {
        let backend = TestBackend::new(100, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let snap = snapshot();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_status_view(frame, area, "ws://127.0.0.1:8000/ws/focus", &snap, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("BRAINWAVE FOCUS"));
        assert!(text.contains("LOW FOCUS"));
    }

    #[test]
    fn test_render_status_view_small_terminal_does_not_panic() {
        let backend = TestBackend::new(20, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let snap = snapshot();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_status_view(frame, area, "ws://x", &snap, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_waiting() {
        let backend = TestBackend::new(60, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::classic();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_waiting(frame, area, &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("Starting focus monitor"));
    }
}
