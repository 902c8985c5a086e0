//! Edit/create form and delete confirmation overlays.
//!
//! The modals know nothing about the listing behind them. They turn keys
//! into a [`ModalOutcome`]; the app hands outcomes to the action
//! coordinator, which refetches whichever listing is registered.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use tui_input::{Input, InputRequest};

use coursedesk_core::{CoreError, EditForm, EntityRef};

use crate::theme;
use crate::widgets::centered;

/// What the user asked a modal to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalOutcome {
    Submit(EditForm),
    ConfirmDelete,
    Cancel,
}

/// The overlay currently on screen.
#[derive(Debug)]
pub enum Modal {
    /// Fetching the entity behind an edit.
    Loading(EntityRef),
    Form(FormModal),
    Delete(DeleteModal),
}

impl Modal {
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ModalOutcome> {
        match self {
            Self::Loading(_) => (key.code == KeyCode::Esc).then_some(ModalOutcome::Cancel),
            Self::Form(form) => form.handle_key(key),
            Self::Delete(delete) => delete.handle_key(key),
        }
    }

    pub fn set_busy(&mut self, busy: bool) {
        match self {
            Self::Loading(_) => {}
            Self::Form(form) => form.busy = busy,
            Self::Delete(delete) => delete.busy = busy,
        }
    }

    /// Show a failed action inline; the modal stays open.
    pub fn set_error(&mut self, error: &CoreError) {
        match self {
            Self::Loading(_) => {}
            Self::Form(form) => {
                form.busy = false;
                form.error = Some(error.to_string());
            }
            Self::Delete(delete) => {
                delete.busy = false;
                delete.error = Some(error.to_string());
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        match self {
            Self::Loading(entity) => render_loading(frame, area, entity),
            Self::Form(form) => form.render(frame, area),
            Self::Delete(delete) => delete.render(frame, area),
        }
    }
}

// ── Form ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct FieldInput {
    name: &'static str,
    label: &'static str,
    input: Input,
    choices: Vec<String>,
}

impl FieldInput {
    fn is_choice(&self) -> bool {
        !self.choices.is_empty()
    }
}

#[derive(Debug)]
pub struct FormModal {
    form: EditForm,
    title: String,
    fields: Vec<FieldInput>,
    focus: usize,
    pub busy: bool,
    pub error: Option<String>,
}

impl FormModal {
    /// `entity` is `None` for a create.
    pub fn new(form: EditForm, entity: Option<&EntityRef>) -> Self {
        let kind = form.kind();
        let title = match entity {
            Some(entity) => format!(" Edit {} {} ", kind.singular(), entity.token),
            None => format!(" New {} ", kind.singular()),
        };
        let fields = form
            .fields()
            .into_iter()
            .map(|field| FieldInput {
                name: field.name,
                label: field.label,
                input: Input::new(field.value),
                choices: field.choices,
            })
            .collect();
        Self {
            form,
            title,
            fields,
            focus: 0,
            busy: false,
            error: None,
        }
    }

    /// Current text of field `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.input.value())
    }

    /// The form with every input applied, validated.
    pub fn collect(&self) -> Result<EditForm, CoreError> {
        let mut form = self.form.clone();
        for field in &self.fields {
            form.set_field(field.name, field.input.value())?;
        }
        form.validate()?;
        Ok(form)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ModalOutcome> {
        if self.busy {
            return None;
        }
        match key.code {
            KeyCode::Esc => return Some(ModalOutcome::Cancel),
            KeyCode::Enter => {
                return match self.collect() {
                    Ok(form) => {
                        self.error = None;
                        Some(ModalOutcome::Submit(form))
                    }
                    Err(e) => {
                        self.error = Some(e.to_string());
                        None
                    }
                };
            }
            KeyCode::Tab | KeyCode::Down => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            _ => self.edit_focused(key),
        }
        None
    }

    fn move_focus(&mut self, forward: bool) {
        let len = self.fields.len();
        if len == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
    }

    fn edit_focused(&mut self, key: KeyEvent) {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };

        if field.is_choice() {
            let forward = match key.code {
                KeyCode::Right | KeyCode::Char(' ') => true,
                KeyCode::Left => false,
                _ => return,
            };
            let len = field.choices.len();
            let next = match field.choices.iter().position(|c| c == field.input.value()) {
                Some(i) if forward => (i + 1) % len,
                Some(i) => (i + len - 1) % len,
                None => 0,
            };
            field.input = Input::new(field.choices[next].clone());
            return;
        }

        let request = match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputRequest::DeleteLine
            }
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return,
        };
        field.input.handle(request);
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        #[allow(clippy::cast_possible_truncation)]
        let height = (self.fields.len() as u16) * 2 + 6;
        let overlay = centered(area, 64, height);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .title(self.title.as_str())
            .title_style(Style::default().fg(theme::YELLOW).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme::border_focused());
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let label_style = Style::default().fg(theme::TEXT);
        let focused_label = Style::default().fg(theme::YELLOW).add_modifier(Modifier::BOLD);
        let value_style = Style::default().fg(theme::HEADING);

        let mut lines = Vec::new();
        for (idx, field) in self.fields.iter().enumerate() {
            let focused = idx == self.focus;
            let marker = if focused { "▸ " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", field.label),
                if focused { focused_label } else { label_style },
            )));

            let value = if field.is_choice() {
                let shown = if field.input.value().is_empty() {
                    "(choose)"
                } else {
                    field.input.value()
                };
                format!("    ◂ {shown} ▸")
            } else {
                format!("    {}", field.input.value())
            };
            lines.push(Line::from(Span::styled(value, value_style)));
        }

        lines.push(Line::from(""));
        match (&self.error, self.busy) {
            (_, true) => lines.push(Line::from(Span::styled("  Saving…", theme::key_hint()))),
            (Some(err), false) => lines.push(Line::from(Span::styled(
                format!("  {err}"),
                theme::error_text(),
            ))),
            (None, false) => lines.push(Line::from(vec![
                Span::styled("  Tab ", theme::key_hint_key()),
                Span::styled("next  ", theme::key_hint()),
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("save  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ])),
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

        // Terminal cursor on the focused text field
        if let Some(field) = self.fields.get(self.focus) {
            if !field.is_choice() {
                #[allow(clippy::cast_possible_truncation)]
                let row = inner.y + (self.focus as u16) * 2 + 1;
                #[allow(clippy::cast_possible_truncation)]
                let col = inner.x + 4 + field.input.visual_cursor() as u16;
                if row < inner.bottom() && col < inner.right() {
                    frame.set_cursor_position((col, row));
                }
            }
        }
    }
}

// ── Delete confirmation ──────────────────────────────────────────────

#[derive(Debug)]
pub struct DeleteModal {
    entity: EntityRef,
    pub busy: bool,
    pub error: Option<String>,
}

impl DeleteModal {
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            busy: false,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ModalOutcome> {
        if self.busy {
            return None;
        }
        match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(ModalOutcome::ConfirmDelete),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(ModalOutcome::Cancel),
            _ => None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let overlay = centered(area, 52, 7);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .title(format!(" Delete {} ", self.entity.kind.singular()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::RED));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let status = if self.busy {
            Line::from(Span::styled("  Deleting…", theme::key_hint()))
        } else if let Some(err) = &self.error {
            Line::from(Span::styled(format!("  {err}"), theme::error_text()))
        } else {
            Line::from(vec![
                Span::styled("  y ", theme::key_hint_key()),
                Span::styled("delete    ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ])
        };

        let text = vec![
            Line::from(Span::styled(
                format!(
                    "  Delete {} {}? This cannot be undone.",
                    self.entity.kind.singular(),
                    self.entity.token
                ),
                Style::default().fg(theme::TEXT),
            )),
            Line::from(""),
            status,
        ];
        frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
    }
}

fn render_loading(frame: &mut Frame, area: Rect, entity: &EntityRef) {
    let overlay = centered(area, 40, 3);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!(" Loading {} {}…", entity.kind.singular(), entity.token),
            theme::key_hint(),
        )),
        inner,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_core::{EntityKind, encode};
    use crossterm::event::KeyEventKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        let mut event = KeyEvent::new(code, KeyModifiers::NONE);
        event.kind = KeyEventKind::Press;
        event
    }

    fn type_text(modal: &mut FormModal, text: &str) {
        for c in text.chars() {
            modal.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn subject_form_types_into_focused_field() {
        let mut modal = FormModal::new(EditForm::blank(EntityKind::Subjects), None);
        type_text(&mut modal, "Rust");
        modal.handle_key(key(KeyCode::Tab));
        type_text(&mut modal, "Ownership");
        modal.handle_key(key(KeyCode::Backspace));

        assert_eq!(modal.value("name"), Some("Rust"));
        assert_eq!(modal.value("description"), Some("Ownershi"));

        let Some(ModalOutcome::Submit(form)) = modal.handle_key(key(KeyCode::Enter)) else {
            panic!("expected submit");
        };
        assert_eq!(form.kind(), EntityKind::Subjects);
    }

    #[test]
    fn incomplete_form_shows_error_and_stays_open() {
        let mut modal = FormModal::new(EditForm::blank(EntityKind::Subjects), None);
        type_text(&mut modal, "Rust");
        assert_eq!(modal.handle_key(key(KeyCode::Enter)), None);
        assert!(modal.error.as_deref().unwrap().contains("required"));
    }

    #[test]
    fn choice_fields_cycle() {
        let user = json!({ "id": 7, "name": "ana", "email": "a@x", "role": "trainee", "status": "pending" });
        let form = EditForm::from_entity(EntityKind::Users, &user).unwrap();
        let entity = EntityRef::new(EntityKind::Users, encode(7));
        let mut modal = FormModal::new(form, Some(&entity));

        modal.handle_key(key(KeyCode::Right));
        assert_eq!(modal.value("role"), Some("admin"));
        modal.handle_key(key(KeyCode::Left));
        assert_eq!(modal.value("role"), Some("trainee"));
        // Typing does nothing on a choice field
        modal.handle_key(key(KeyCode::Char('x')));
        assert_eq!(modal.value("role"), Some("trainee"));
    }

    #[test]
    fn busy_form_ignores_keys() {
        let mut modal = FormModal::new(EditForm::blank(EntityKind::Subjects), None);
        modal.busy = true;
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), None);
        type_text(&mut modal, "x");
        assert_eq!(modal.value("name"), Some(""));
    }

    #[test]
    fn delete_modal_keys() {
        let entity = EntityRef::new(EntityKind::Subjects, encode(42));
        let mut modal = DeleteModal::new(entity);
        assert_eq!(modal.handle_key(key(KeyCode::Char('x'))), None);
        assert_eq!(
            modal.handle_key(key(KeyCode::Char('y'))),
            Some(ModalOutcome::ConfirmDelete)
        );
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), Some(ModalOutcome::Cancel));
    }

    #[test]
    fn failed_action_is_shown_inline() {
        let entity = EntityRef::new(EntityKind::Subjects, encode(42));
        let mut modal = Modal::Delete(DeleteModal::new(entity));
        modal.set_busy(true);
        modal.set_error(&CoreError::Http {
            status: 409,
            message: "Subject has tasks".into(),
        });
        let Modal::Delete(delete) = &modal else { unreachable!() };
        assert!(!delete.busy);
        assert!(delete.error.as_deref().unwrap().contains("Subject has tasks"));
    }
}
