//! Login gate: paste an admin API token.
//!
//! The token goes straight into the session; whether the server accepts it
//! is learned from the first listing fetch.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use secrecy::SecretString;
use tracing::{info, warn};
use tui_input::{Input, InputRequest};

use coursedesk_core::Session;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::centered;

pub struct LoginScreen {
    session: Session,
    input: Input,
    reveal: bool,
    error: Option<String>,
}

impl LoginScreen {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            input: Input::default(),
            reveal: false,
            error: None,
        }
    }

    fn submit(&mut self) -> Option<Action> {
        let token = self.input.value().trim().to_owned();
        if token.is_empty() {
            self.error = Some("token must not be empty".into());
            return None;
        }
        match self.session.login(SecretString::from(token)) {
            Ok(()) => {
                info!("logged in");
                self.input.reset();
                self.error = None;
                Some(Action::LoggedIn)
            }
            Err(e) => {
                warn!(error = %e, "could not store token");
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

impl Component for LoginScreen {
    fn mount(&mut self) {
        self.input.reset();
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let request = match key.code {
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Esc => return Ok(Some(Action::Quit)),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reveal = !self.reveal;
                return Ok(None);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputRequest::DeleteLine
            }
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            _ => return Ok(None),
        };
        self.input.handle(request);
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BACKDROP)),
            area,
        );

        let panel = centered(area, 60, 11);
        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled("Coursedesk Admin", theme::title_style()),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(
                "Paste an admin API token",
                Style::default().fg(theme::HEADING).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            layout[0],
        );

        let value = self.input.value();
        let display = if self.reveal {
            value.to_owned()
        } else {
            "\u{25CF}".repeat(value.chars().count())
        };
        let field = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let field_inner = field.inner(layout[1]);
        frame.render_widget(field, layout[1]);
        frame.render_widget(
            Paragraph::new(Span::styled(display, Style::default().fg(theme::TEXT))),
            field_inner,
        );
        #[allow(clippy::cast_possible_truncation)]
        let col = field_inner.x + self.input.visual_cursor() as u16;
        if col < field_inner.right() {
            frame.set_cursor_position((col, field_inner.y));
        }

        if let Some(err) = &self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::error_text()))
                    .alignment(Alignment::Center),
                layout[2],
            );
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("log in  ", theme::key_hint()),
                Span::styled("Ctrl+r ", theme::key_hint_key()),
                Span::styled("show  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("quit", theme::key_hint()),
            ]))
            .alignment(Alignment::Center),
            layout[4],
        );
    }

    fn captures_input(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn press(screen: &mut LoginScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn empty_token_is_rejected() {
        let session = Session::ephemeral();
        let mut screen = LoginScreen::new(session.clone());
        assert!(press(&mut screen, KeyCode::Enter).is_none());
        assert!(screen.error.is_some());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn typed_token_logs_in() {
        let session = Session::ephemeral();
        let mut screen = LoginScreen::new(session.clone());
        for c in "t0k".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        assert!(matches!(press(&mut screen, KeyCode::Enter), Some(Action::LoggedIn)));
        assert!(session.is_authenticated());
        assert_eq!(screen.input.value(), "");
    }
}
