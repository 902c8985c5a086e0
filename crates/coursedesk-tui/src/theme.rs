//! Palette and semantic styles for the console.

use ratatui::style::{Color, Modifier, Style};

use coursedesk_core::StatusTone;

// ── Palette ──────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(122, 162, 247); // #7aa2f7
pub const HEADING: Color = Color::Rgb(125, 207, 255); // #7dcfff
pub const TEXT: Color = Color::Rgb(192, 202, 245); // #c0caf5
pub const MUTED: Color = Color::Rgb(86, 95, 137); // #565f89
pub const SURFACE: Color = Color::Rgb(36, 40, 59); // #24283b
pub const BACKDROP: Color = Color::Rgb(26, 27, 38); // #1a1b26

pub const GREEN: Color = Color::Rgb(158, 206, 106); // #9ece6a
pub const ORANGE: Color = Color::Rgb(255, 158, 100); // #ff9e64
pub const PURPLE: Color = Color::Rgb(187, 154, 247); // #bb9af7
pub const VIOLET: Color = Color::Rgb(157, 124, 216); // #9d7cd8
pub const RED: Color = Color::Rgb(247, 118, 142); // #f7768e
pub const BLUE: Color = Color::Rgb(42, 195, 222); // #2ac3de
pub const YELLOW: Color = Color::Rgb(224, 175, 104); // #e0af68

/// Badge color for a status or role value.
pub fn tone_color(tone: StatusTone) -> Color {
    match tone {
        StatusTone::Green => GREEN,
        StatusTone::Orange => ORANGE,
        StatusTone::Purple => PURPLE,
        StatusTone::Violet => VIOLET,
        StatusTone::Red => RED,
        StatusTone::Blue => BLUE,
        StatusTone::Neutral => TEXT,
    }
}

// ── Semantic Styles ──────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(HEADING).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(HEADING)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Header cell under the column cursor.
pub fn table_header_active() -> Style {
    Style::default()
        .fg(BACKDROP)
        .bg(HEADING)
        .add_modifier(Modifier::BOLD)
}

pub fn table_row() -> Style {
    Style::default().fg(TEXT)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(SURFACE)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(TEXT)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(HEADING).add_modifier(Modifier::BOLD)
}

pub fn error_text() -> Style {
    Style::default().fg(RED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_values_get_distinct_badges() {
        let approved = tone_color(StatusTone::of("approved"));
        let pending = tone_color(StatusTone::of("pending"));
        let rejected = tone_color(StatusTone::of("rejected"));
        assert_eq!(approved, GREEN);
        assert_eq!(pending, ORANGE);
        assert_eq!(rejected, RED);
        assert_eq!(tone_color(StatusTone::of("archived")), TEXT);
    }
}
