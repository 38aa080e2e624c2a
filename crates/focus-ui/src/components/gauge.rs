use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Visual configuration of a gauge.
pub struct GaugeConfig {
    /// Width in columns of the bar portion (excluding label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

// ── ConcentrationGauge ───────────────────────────────────────────────────────

/// Horizontal bar showing the latest concentration percentage, coloured by
/// tier. Without a reading the bar is empty and the label shows `--`.
pub struct ConcentrationGauge<'a> {
    /// Clamped to `[0.0, 100.0]`.
    pub value: Option<f64>,
    pub theme: &'a Theme,
    pub config: GaugeConfig,
}

impl<'a> ConcentrationGauge<'a> {
    pub fn new(value: Option<f64>, theme: &'a Theme) -> Self {
        Self {
            value: value.map(|v| v.clamp(0.0, 100.0)),
            theme,
            config: GaugeConfig::default(),
        }
    }

    /// Number of filled cells for the current value.
    pub fn filled_cells(&self) -> u16 {
        let pct = self.value.unwrap_or(0.0);
        ((pct / 100.0) * self.config.width as f64).round() as u16
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled = self.filled_cells().min(self.config.width);
        let empty = self.config.width - filled;

        let (bar_style, label) = match self.value {
            Some(v) => (self.theme.concentration_style(v), format!(" {v:.0} %")),
            None => (self.theme.dim, " -- %".to_string()),
        };

        Line::from(vec![
            Span::styled("🧠 Focus  ", self.theme.label),
            Span::styled(
                self.config.filled_char.to_string().repeat(filled as usize),
                bar_style,
            ),
            Span::styled(
                self.config.empty_char.to_string().repeat(empty as usize),
                self.theme.gauge_empty,
            ),
            Span::styled(label, bar_style),
        ])
    }
}
