//! Detail screen: one entity, reached through a listing's view action.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use serde_json::Value;
use throbber_widgets_tui::{Throbber, ThrobberState};

use coursedesk_core::{
    EntityKind, EntityRef, FetchRequest, FetchResult, ModalKind, Payload, Query, cell_text,
};

use crate::action::Action;
use crate::component::Component;
use crate::screens::Services;
use crate::theme;

/// Entity behind a detail route (`/subjects/NDI=`).
pub fn parse_route(route: &str) -> Option<EntityRef> {
    let mut segments = route.trim_start_matches('/').split('/');
    let kind: EntityKind = segments.next()?.parse().ok()?;
    let token = segments.next()?.parse().ok()?;
    if segments.next().is_some() {
        return None;
    }
    Some(EntityRef::new(kind, token))
}

pub struct DetailScreen {
    services: Services,
    entity: Option<EntityRef>,
    query: Option<Query>,
    result: FetchResult,
    throbber: ThrobberState,
}

impl DetailScreen {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            entity: None,
            query: None,
            result: FetchResult::default(),
            throbber: ThrobberState::default(),
        }
    }

    /// Show `entity`, dropping whatever was shown before.
    fn open(&mut self, entity: EntityRef) {
        if let Some(query) = self.query.take() {
            query.cancel();
        }
        self.entity = Some(entity);
        self.result = FetchResult::default();
        self.load();
    }

    fn load(&mut self) {
        let Some(entity) = self.entity.clone() else {
            return;
        };
        let query = self
            .query
            .get_or_insert_with(|| Query::new(self.services.client.clone()))
            .clone();
        self.result.is_loading = true;

        let tx = self.services.action_tx.clone();
        let request = FetchRequest::new(entity.kind.entity_endpoint(entity.id()));
        tokio::spawn(async move {
            let result = query.fetch(request).await;
            if !query.is_cancelled() {
                let _ = tx.send(Action::DetailLoaded(entity, result));
            }
        });
    }

    fn entity_value(&self) -> Option<&Value> {
        match self.result.data.as_ref()? {
            Payload::Single(value) => Some(value),
            Payload::Many(rows) => rows.first(),
        }
    }

    fn field_lines(&self) -> Vec<Line<'static>> {
        let Some(Value::Object(fields)) = self.entity_value() else {
            return Vec::new();
        };
        let width = fields.keys().map(String::len).max().unwrap_or(0);
        fields
            .iter()
            .map(|(key, value)| {
                let text = if key.ends_with("_at") || key.ends_with("_date") {
                    coursedesk_core::view::format_date(&cell_text(Some(value)))
                } else {
                    cell_text(Some(value))
                };
                Line::from(vec![
                    Span::styled(format!("  {key:<width$}  "), theme::key_hint()),
                    Span::styled(text, theme::table_row()),
                ])
            })
            .collect()
    }
}

impl Component for DetailScreen {
    fn unmount(&mut self) {
        if let Some(query) = self.query.take() {
            query.cancel();
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let Some(entity) = self.entity.clone() else {
            return Ok(None);
        };
        Ok(match key.code {
            KeyCode::Char('e') => Some(Action::OpenModal {
                kind: ModalKind::Edit,
                entity,
            }),
            KeyCode::Char('d') => Some(Action::OpenModal {
                kind: ModalKind::Delete,
                entity,
            }),
            KeyCode::Char('r') => {
                self.load();
                None
            }
            _ => None,
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Navigate(route) => {
                if let Some(entity) = parse_route(route) {
                    self.open(entity);
                }
            }
            Action::DetailLoaded(entity, result) if self.entity.as_ref() == Some(entity) => {
                self.result = result.clone();
            }
            Action::Reload => self.load(),
            Action::Tick if self.result.is_loading => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.entity {
            Some(entity) => format!(" {} {} ", entity.kind.singular(), entity.token),
            None => " Detail ".to_owned(),
        };
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(inner);

        if self.result.is_loading {
            let throbber = Throbber::default()
                .label("Loading")
                .style(Style::default().fg(theme::HEADING))
                .throbber_style(Style::default().fg(theme::ACCENT));
            frame.render_stateful_widget(throbber, layout[0], &mut self.throbber.clone());
        } else if let Some(err) = &self.result.error {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" ✗ {err}"), theme::error_text())),
                layout[0],
            );
        }

        frame.render_widget(
            Paragraph::new(self.field_lines()).wrap(Wrap { trim: false }),
            layout[1],
        );
    }

    fn hints(&self) -> &'static str {
        "e edit  d delete  r reload  Esc back"
    }
}
