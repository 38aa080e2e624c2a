use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are considered dark; 7–15 are considered light. Absent or unparseable
/// values give `BackgroundType::Dark`.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

const ORANGE: Color = Color::Rgb(255, 165, 0);

/// Concentration tier boundaries, highest first.
pub const TIER_HIGH: f64 = 80.0;
pub const TIER_GOOD: f64 = 60.0;
pub const TIER_FAIR: f64 = 40.0;

/// All styles used by the status panel.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Transitional states (connecting); rendered blinking where supported.
    pub pending: Style,

    // ── Concentration tiers ──────────────────────────────────────────────────
    /// ≥ 80 %.
    pub tier_high: Style,
    /// ≥ 60 %.
    pub tier_good: Style,
    /// ≥ 40 %.
    pub tier_fair: Style,
    /// Below 40 %.
    pub tier_low: Style,
    pub gauge_empty: Style,

    // ── Learning mode ────────────────────────────────────────────────────────
    pub learning_on: Style,
    pub learning_off: Style,
    pub alert: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            pending: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),

            tier_high: Style::default().fg(Color::Green),
            tier_good: Style::default().fg(Color::Yellow),
            tier_fair: Style::default().fg(ORANGE),
            tier_low: Style::default().fg(Color::Red),
            gauge_empty: Style::default().fg(Color::DarkGray),

            learning_on: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            learning_off: Style::default().fg(Color::Gray),
            alert: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            pending: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),

            tier_high: Style::default().fg(Color::Green),
            tier_good: Style::default().fg(Color::Yellow),
            tier_fair: Style::default().fg(ORANGE),
            tier_low: Style::default().fg(Color::Red),
            gauge_empty: Style::default().fg(Color::Gray),

            learning_on: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            learning_off: Style::default().fg(Color::DarkGray),
            alert: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        }
    }

    /// Basic 8-colour ANSI palette, no modifiers.
    ///
    /// Orange has no ANSI equivalent, so the fair tier uses light red.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            pending: Style::default().fg(Color::Yellow),

            tier_high: Style::default().fg(Color::Green),
            tier_good: Style::default().fg(Color::Yellow),
            tier_fair: Style::default().fg(Color::LightRed),
            tier_low: Style::default().fg(Color::Red),
            gauge_empty: Style::default().fg(Color::DarkGray),

            learning_on: Style::default().fg(Color::Green),
            learning_off: Style::default().fg(Color::Gray),
            alert: Style::default().fg(Color::Red),
        }
    }

    /// Choose a theme from the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name, falling back to `auto_detect`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Tier colour for a concentration percentage.
    ///
    /// | Concentration | Tier  |
    /// |---------------|-------|
    /// | ≥ 80          | high  |
    /// | ≥ 60          | good  |
    /// | ≥ 40          | fair  |
    /// | < 40          | low   |
    pub fn concentration_style(&self, value: f64) -> Style {
        if value >= TIER_HIGH {
            self.tier_high
        } else if value >= TIER_GOOD {
            self.tier_good
        } else if value >= TIER_FAIR {
            self.tier_fair
        } else {
            self.tier_low
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
