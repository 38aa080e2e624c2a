use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Decoration placed either side of the title.
pub const WAVES: &str = "∿ ∿ ∿";

/// Width of the separator rule.
pub const SEPARATOR_WIDTH: usize = 60;

/// Panel header rendering four lines:
///
/// 1. Title with wave decorations.
/// 2. A `=` separator.
/// 3. The endpoint in `[ endpoint ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    pub endpoint: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(endpoint: &'a str, theme: &'a Theme) -> Self {
        Self { endpoint, theme }
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(vec![
                Span::styled(WAVES, self.theme.header_accent),
                Span::styled(" BRAINWAVE FOCUS ", self.theme.header),
                Span::styled(WAVES, self.theme.header_accent),
            ]),
            Line::from(Span::styled(
                "=".repeat(SEPARATOR_WIDTH),
                self.theme.separator,
            )),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.endpoint, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_has_four_lines() {
        let theme = Theme::dark();
        let lines = Header::new("ws://127.0.0.1:8000/ws/focus", &theme).to_lines();
        assert_eq!(lines.len(), 4);
        assert!(text(&lines[3]).is_empty());
    }

    #[test]
    fn test_header_title_and_endpoint() {
        let theme = Theme::dark();
        let lines = Header::new("ws://10.0.0.2:9000/ws/focus", &theme).to_lines();

        let title = text(&lines[0]);
        assert!(title.contains("BRAINWAVE FOCUS"), "got: {title}");
        assert!(title.starts_with(WAVES));

        assert_eq!(text(&lines[2]), "[ ws://10.0.0.2:9000/ws/focus ]");
    }

    #[test]
    fn test_header_separator_width() {
        let theme = Theme::dark();
        let lines = Header::new("ws://x", &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), SEPARATOR_WIDTH);
        assert!(sep.chars().all(|c| c == '='));
    }
}
