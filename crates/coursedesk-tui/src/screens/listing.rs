//! Listing screen: one entity kind's table.
//!
//! Owns a core [`Listing`] bound to an in-memory route, so every page,
//! filter and sort change is mirrored into `/users?page=2&...` and shown in
//! the header. While mounted it holds the coordinator's refetch
//! registration; the modal overlay never sees this screen directly.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tui_input::{Input, InputRequest};

use coursedesk_core::{
    ActionDispatch, CellKind, Column, EntityKind, Listing, MemoryLocation, Relation, SortOrder,
    StatusTone, TableStatePatch, TableView,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::data_bridge;
use crate::screens::Services;
use crate::theme;

/// Inline filter prompt for the column under the cursor.
struct FilterPrompt {
    column: &'static str,
    caption: &'static str,
    relation: Relation,
    input: Input,
}

impl FilterPrompt {
    fn cycle_relation(&mut self) {
        self.relation = match self.relation {
            Relation::Contains => Relation::StartsWith,
            Relation::StartsWith => Relation::Equals,
            Relation::Equals => Relation::Contains,
        };
    }
}

pub struct ListingScreen {
    kind: EntityKind,
    services: Services,
    listing: Listing,
    location: MemoryLocation,
    view: TableView,
    selected: usize,
    column: usize,
    filter: Option<FilterPrompt>,
    throbber: ThrobberState,
    bridge_cancel: Option<CancellationToken>,
    follow: Option<JoinHandle<()>>,
}

impl ListingScreen {
    pub fn new(kind: EntityKind, services: Services) -> Self {
        let location = MemoryLocation::new(kind.route());
        let listing = Listing::new(
            kind,
            services.client.clone(),
            services.discipline,
            services.page_size,
            Some(Arc::new(location.clone())),
        );
        let view = listing.view();
        Self {
            kind,
            services,
            listing,
            location,
            view,
            selected: 0,
            column: 0,
            filter: None,
            throbber: ThrobberState::default(),
            bridge_cancel: None,
            follow: None,
        }
    }

    fn refresh_view(&mut self) {
        self.view = self.listing.view();
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.view.rows.len().saturating_sub(1));
    }

    /// Update table state and fetch. The view is rebuilt at once so sort
    /// and filter markers move before the data arrives.
    fn apply(&mut self, patch: TableStatePatch) {
        debug!(kind = %self.kind, ?patch, "table state change");
        self.listing.spawn_apply(patch);
        self.refresh_view();
    }

    fn current_column(&self) -> Option<&Column> {
        self.view.columns.get(self.column)
    }

    fn dispatch_row(&self, action_id: &str) -> Option<Action> {
        if self.view.rows.is_empty() {
            return None;
        }
        match self.view.activate(self.selected, action_id) {
            Ok(ActionDispatch::Navigate { route }) => Some(Action::Navigate(route)),
            Ok(ActionDispatch::OpenModal { kind, entity }) => {
                Some(Action::OpenModal { kind, entity })
            }
            Err(e) => Some(Action::Notify(Notification::error(e.to_string()))),
        }
    }

    fn open_filter(&mut self) -> Option<Action> {
        let column = self.current_column()?;
        let (id, caption) = (column.id, column.caption);
        if !column.filterable {
            return Some(Action::Notify(Notification::info(format!(
                "{caption} cannot be filtered"
            ))));
        }
        let existing = self.view.state.filter_for(id).cloned();
        self.filter = Some(FilterPrompt {
            column: id,
            caption,
            relation: existing.as_ref().map_or(Relation::Contains, |f| f.relation),
            input: Input::new(existing.map(|f| f.value).unwrap_or_default()),
        });
        None
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Option<Action> {
        let prompt = self.filter.as_mut()?;
        let request = match key.code {
            KeyCode::Esc => {
                self.filter = None;
                return None;
            }
            KeyCode::Enter => {
                let prompt = self.filter.take()?;
                let patch =
                    self.view
                        .set_filter(prompt.column, prompt.relation, prompt.input.value())?;
                self.apply(patch);
                return None;
            }
            KeyCode::Tab => {
                prompt.cycle_relation();
                return None;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputRequest::DeleteLine
            }
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            _ => return None,
        };
        prompt.input.handle(request);
        None
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn header_cell(&self, idx: usize, column: &Column) -> Cell<'static> {
        let sorters = &self.view.state.sorters;
        let mut caption = column.caption.to_owned();
        if let Some(pos) = sorters.iter().position(|s| s.column == column.id) {
            caption.push_str(match sorters[pos].order {
                SortOrder::Asc => " ▲",
                SortOrder::Desc => " ▼",
            });
            if sorters.len() > 1 {
                caption.push_str(&(pos + 1).to_string());
            }
        }
        if self.view.state.filter_for(column.id).is_some() {
            caption.push_str(" ⚲");
        }
        let style = if idx == self.column {
            theme::table_header_active()
        } else {
            theme::table_header()
        };
        Cell::from(caption).style(style)
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::horizontal([Constraint::Min(1), Constraint::Length(16)]).split(area);
        let line = Line::from(vec![
            Span::styled(format!(" {} ", self.kind.title()), theme::title_style()),
            Span::styled(self.location.route(), theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), chunks[0]);

        if self.view.is_loading {
            let throbber = Throbber::default()
                .label("Loading")
                .style(Style::default().fg(theme::HEADING))
                .throbber_style(Style::default().fg(theme::ACCENT));
            frame.render_stateful_widget(throbber, chunks[1], &mut self.throbber.clone());
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ({}) ", self.kind.title(), self.view.total_records()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.view.is_empty() {
            let text = if self.view.is_loading {
                String::new()
            } else {
                self.view.empty_message()
            };
            frame.render_widget(
                Paragraph::new(Span::styled(text, theme::key_hint())).alignment(Alignment::Center),
                inner,
            );
            return;
        }

        let header = Row::new(
            self.view
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| self.header_cell(i, c))
                .collect::<Vec<_>>(),
        );

        let rows: Vec<Row> = self
            .view
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let prefix = if i == self.selected { "▸" } else { " " };
                let cells = self.view.columns.iter().zip(&row.cells).enumerate().map(
                    |(col, (column, text))| {
                        let style = match column.kind {
                            CellKind::Status => Style::default()
                                .fg(theme::tone_color(StatusTone::of(text)))
                                .add_modifier(Modifier::BOLD),
                            CellKind::Initial => Style::default()
                                .fg(theme::BACKDROP)
                                .bg(theme::ACCENT)
                                .add_modifier(Modifier::BOLD),
                            CellKind::Number | CellKind::Date => Style::default().fg(theme::HEADING),
                            CellKind::Text => theme::table_row(),
                        };
                        let text = if col == 0 {
                            format!("{prefix}{text}")
                        } else {
                            text.clone()
                        };
                        Cell::from(text).style(style)
                    },
                );
                Row::new(cells.collect::<Vec<_>>())
            })
            .collect();

        let widths: Vec<Constraint> = self
            .view
            .columns
            .iter()
            .map(|c| match c.kind {
                CellKind::Initial => Constraint::Length(4),
                CellKind::Number => Constraint::Length(10),
                CellKind::Date => Constraint::Length(12),
                CellKind::Status => Constraint::Length(10),
                CellKind::Text => Constraint::Min(12),
            })
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());
        let mut state = TableState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(table, inner, &mut state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some(prompt) = &self.filter {
            let line = Line::from(vec![
                Span::styled(
                    format!(" {} {} ", prompt.caption, prompt.relation),
                    Style::default().fg(theme::ACCENT),
                ),
                Span::styled(prompt.input.value(), Style::default().fg(theme::HEADING)),
                Span::styled("█", Style::default().fg(theme::HEADING)),
                Span::styled("  Tab relation  Enter apply  Esc cancel", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        if let Some(err) = &self.view.error {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" ✗ {err}"), theme::error_text())),
                area,
            );
            return;
        }

        let filters = self
            .view
            .state
            .filters
            .iter()
            .map(|f| format!("{} {} \"{}\"", f.column, f.relation, f.value))
            .collect::<Vec<_>>()
            .join(", ");
        let mut spans = vec![Span::styled(
            format!(
                " Page {} of {} · {} {}",
                self.view.current_page(),
                self.view.last_page(),
                self.view.total_records(),
                self.kind.family()
            ),
            theme::table_row(),
        )];
        if !filters.is_empty() {
            spans.push(Span::styled(format!("  filtered: {filters}"), theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Component for ListingScreen {
    fn mount(&mut self) {
        self.listing.mount(&self.services.coordinator);
        self.follow = Some(self.listing.follow(self.services.coordinator.mutator()));

        let cancel = CancellationToken::new();
        tokio::spawn(data_bridge::listing_bridge(
            self.kind,
            self.listing.subscribe(),
            self.services.action_tx.clone(),
            cancel.clone(),
        ));
        self.bridge_cancel = Some(cancel);

        self.listing.spawn_load();
        self.refresh_view();
    }

    fn unmount(&mut self) {
        if let Some(cancel) = self.bridge_cancel.take() {
            cancel.cancel();
        }
        if let Some(follow) = self.follow.take() {
            follow.abort();
        }
        self.filter = None;
        self.listing.unmount();
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.filter.is_some() {
            return Ok(self.handle_filter_key(key));
        }

        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.view.rows.len().saturating_sub(1));
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.selected = 0;
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.selected = self.view.rows.len().saturating_sub(1);
                None
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.column = self.column.saturating_sub(1);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.column = (self.column + 1).min(self.view.columns.len().saturating_sub(1));
                None
            }
            KeyCode::Char('s') => {
                let Some(column) = self.current_column() else {
                    return Ok(None);
                };
                let caption = column.caption;
                match self.view.toggle_sort(column.id) {
                    Some(patch) => {
                        self.apply(patch);
                        None
                    }
                    None => Some(Action::Notify(Notification::info(format!(
                        "{caption} cannot be sorted"
                    )))),
                }
            }
            KeyCode::Char('f') => self.open_filter(),
            KeyCode::Char('c') => {
                if !self.view.state.filters.is_empty() {
                    let patch = self.view.clear_filters();
                    self.apply(patch);
                }
                None
            }
            KeyCode::Char('n' | ']') => {
                if let Some(patch) = self.view.next_page() {
                    self.apply(patch);
                }
                None
            }
            KeyCode::Char('p' | '[') => {
                if let Some(patch) = self.view.prev_page() {
                    self.apply(patch);
                }
                None
            }
            KeyCode::Char('r') => {
                self.listing.spawn_load();
                None
            }
            KeyCode::Enter => self.dispatch_row("view"),
            KeyCode::Char('e') => self.dispatch_row("edit"),
            KeyCode::Char('d') => self.dispatch_row("delete"),
            KeyCode::Char('a') => Some(Action::OpenCreate(self.kind)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ListingUpdated(kind, result) if *kind == self.kind => {
                self.view = TableView::build(self.kind, &self.listing.state(), result);
                self.clamp_selection();
            }
            Action::Tick if self.view.is_loading => self.throbber.calc_next(),
            Action::Reload => {
                self.listing.spawn_load();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        self.render_table(frame, layout[1]);
        self.render_footer(frame, layout[2]);
    }

    fn captures_input(&self) -> bool {
        self.filter.is_some()
    }

    fn hints(&self) -> &'static str {
        if self.kind.supports_create() {
            "s sort  f filter  c clear  n/p page  Enter view  e edit  d delete  a add"
        } else {
            "s sort  f filter  c clear  n/p page  Enter view  e edit  d delete"
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_core::{
        ActionCoordinator, ClientConfig, FetchResult, FilterDiscipline, FilterRule, Mutator,
        Payload, Session,
    };
    use crossterm::event::KeyModifiers;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;
    use tokio::sync::mpsc;
    use url::Url;

    fn screen(kind: EntityKind) -> (ListingScreen, mpsc::UnboundedReceiver<Action>) {
        let client = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
            .connect(Session::ephemeral())
            .unwrap();
        let (action_tx, rx) = mpsc::unbounded_channel();
        let services = Services {
            coordinator: ActionCoordinator::new(Mutator::new(client.clone())),
            client,
            discipline: FilterDiscipline::Server,
            page_size: 10,
            action_tx,
        };
        (ListingScreen::new(kind, services), rx)
    }

    fn press(screen: &mut ListingScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn subjects() -> FetchResult {
        FetchResult {
            data: Some(Payload::Many(vec![
                json!({ "id": 1, "name": "Rust", "description": "Ownership" }),
                json!({ "id": 2, "name": "Go", "description": "Goroutines" }),
            ])),
            server_filtered: true,
            ..FetchResult::default()
        }
    }

    fn screen_text(screen: &ListingScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        terminal.draw(|frame| screen.render(frame, frame.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[tokio::test]
    async fn sort_key_writes_the_route() {
        let (mut screen, _rx) = screen(EntityKind::Subjects);
        press(&mut screen, KeyCode::Char('s'));
        assert_eq!(screen.listing.state().sorters, vec![coursedesk_core::SortRule::asc("name")]);
        assert!(screen.location.route().starts_with("/subjects?sorters="));

        press(&mut screen, KeyCode::Char('s'));
        assert_eq!(screen.listing.state().sorters[0].order, SortOrder::Desc);
    }

    #[tokio::test]
    async fn filter_prompt_applies_on_enter() {
        let (mut screen, _rx) = screen(EntityKind::Subjects);
        press(&mut screen, KeyCode::Char('l'));
        press(&mut screen, KeyCode::Char('f'));
        assert!(screen.captures_input());
        for c in "own".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        press(&mut screen, KeyCode::Enter);

        assert!(!screen.captures_input());
        let state = screen.listing.state();
        assert_eq!(state.filters, vec![FilterRule::contains("description", "own")]);
        assert_eq!(state.page, 1);
    }

    #[tokio::test]
    async fn unfilterable_column_is_reported() {
        let (mut screen, _rx) = screen(EntityKind::Users);
        // First users column is the numeric id
        let action = press(&mut screen, KeyCode::Char('f'));
        assert!(matches!(action, Some(Action::Notify(_))));
        assert!(!screen.captures_input());
    }

    #[test]
    fn row_actions_become_app_actions() {
        let (mut screen, _rx) = screen(EntityKind::Subjects);
        screen
            .update(&Action::ListingUpdated(EntityKind::Subjects, subjects()))
            .unwrap();

        press(&mut screen, KeyCode::Down);
        match press(&mut screen, KeyCode::Enter) {
            Some(Action::Navigate(route)) => assert_eq!(route, "/subjects/Mg=="),
            other => panic!("unexpected {other:?}"),
        }
        match press(&mut screen, KeyCode::Char('d')) {
            Some(Action::OpenModal { kind, entity }) => {
                assert_eq!(kind, coursedesk_core::ModalKind::Delete);
                assert_eq!(entity.id(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn renders_rows_and_empty_message() {
        let (mut screen, _rx) = screen(EntityKind::Subjects);
        screen
            .update(&Action::ListingUpdated(EntityKind::Subjects, FetchResult::default()))
            .unwrap();
        assert!(screen_text(&screen).contains("No subjects found."));

        screen
            .update(&Action::ListingUpdated(EntityKind::Subjects, subjects()))
            .unwrap();
        let text = screen_text(&screen);
        assert!(text.contains("Rust"));
        assert!(text.contains("Goroutines"));
        assert!(text.contains("Page 1 of 1"));
    }

    #[test]
    fn other_kinds_results_are_ignored() {
        let (mut screen, _rx) = screen(EntityKind::Subjects);
        screen
            .update(&Action::ListingUpdated(EntityKind::Tasks, subjects()))
            .unwrap();
        assert!(screen.view.rows.is_empty());
    }
}
