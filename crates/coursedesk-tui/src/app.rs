//! Application core: event loop, screen management, modal hosting.
//!
//! The app is the modal host. Row actions arrive as [`Action::OpenModal`];
//! the app opens the modal through the [`ActionCoordinator`] and hands the
//! outcome back to it. The coordinator refetches whichever listing is
//! mounted, or fires the reload hook (which sends [`Action::Reload`]) when
//! none is.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use coursedesk_core::{
    ActionCoordinator, AdminClient, ClientConfig, CoreError, EditForm, EntityRef, ModalKind,
    ModalState, Mutator, Payload, Settled,
};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::{Services, create_screens};
use crate::theme;
use crate::tui::Tui;
use crate::widgets::centered;
use crate::widgets::modal::{DeleteModal, FormModal, Modal, ModalOutcome};

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    /// Screen to return to on Esc from the detail view.
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    services: Services,
    /// Overlay on top of the active screen; blocks other input.
    modal: Option<Modal>,
    /// Entity whose delete is in flight, for leaving its detail view.
    deleting: Option<EntityRef>,
    notification: Option<(Notification, Instant)>,
    bridge_cancel: CancellationToken,
}

impl App {
    pub fn new(client: AdminClient, config: &ClientConfig) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let coordinator = ActionCoordinator::new(Mutator::new(client.clone()));
        let reload_tx = action_tx.clone();
        coordinator.set_reload_hook(Arc::new(move || {
            let _ = reload_tx.send(Action::Reload);
        }));

        let active_screen = if client.session().is_authenticated() {
            ScreenId::Users
        } else {
            ScreenId::Login
        };

        let services = Services {
            client,
            coordinator,
            discipline: config.discipline,
            page_size: config.page_size,
            action_tx: action_tx.clone(),
        };

        Self {
            active_screen,
            previous_screen: None,
            screens: create_screens(&services),
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            services,
            modal: None,
            deleting: None,
            notification: None,
            bridge_cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        tokio::spawn(data_bridge::coordinator_bridge(
            &self.services.coordinator,
            self.action_tx.clone(),
            self.bridge_cancel.clone(),
        ));
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.mount();
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(screen = %self.active_screen, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.unmount();
        }
        self.bridge_cancel.cancel();
        drop(events);
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input ────────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if let Some(modal) = self.modal.as_mut() {
            return Ok(modal.handle_key(key).map(|outcome| match outcome {
                ModalOutcome::Submit(form) => Action::SubmitForm(form),
                ModalOutcome::ConfirmDelete => Action::ConfirmDelete,
                ModalOutcome::Cancel => Action::CloseModal,
            }));
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        let captured = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());

        if !captured {
            match (key.modifiers, key.code) {
                (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
                (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
                (KeyModifiers::SHIFT, KeyCode::Char('L')) => return Ok(Some(Action::Logout)),
                (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='3')) => {
                    let screen = c
                        .to_digit(10)
                        .and_then(|d| u8::try_from(d).ok())
                        .and_then(ScreenId::from_number);
                    if let Some(screen) = screen {
                        return Ok(Some(Action::SwitchScreen(screen)));
                    }
                }
                (KeyModifiers::NONE, KeyCode::Tab) => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
                }
                (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
                }
                (KeyModifiers::NONE, KeyCode::Esc) if self.active_screen == ScreenId::Detail => {
                    return Ok(Some(Action::GoBack));
                }
                _ => {}
            }
        }

        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Render => {}
            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Tick => {
                if let Some((_, created)) = &self.notification {
                    if created.elapsed() > Duration::from_secs(3) {
                        self.notification = None;
                    }
                }
                self.forward_to_active(action)?;
            }

            Action::SwitchScreen(target) => {
                if self.active_screen == ScreenId::Login {
                    return Ok(());
                }
                self.switch_to(*target);
            }

            Action::GoBack => {
                let target = self.previous_screen.take().unwrap_or(ScreenId::Users);
                self.switch_to(target);
            }

            Action::Navigate(_) => {
                self.switch_to(ScreenId::Detail);
                self.forward_to_active(action)?;
            }

            Action::ListingUpdated(kind, result) => {
                if let Some(err) = result.error.as_ref().filter(|e| e.is_auth()) {
                    warn!(%kind, error = %err, "listing fetch was refused");
                    self.action_tx
                        .send(Action::Notify(Notification::error(err.to_string())))?;
                    self.action_tx.send(Action::Logout)?;
                }
                if let Some(screen) = self.screens.get_mut(&ScreenId::for_kind(*kind)) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::DetailLoaded(..) => {
                if let Some(screen) = self.screens.get_mut(&ScreenId::Detail) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::Reload => {
                // The detail of an entity that was just deleted has nothing to reload
                if self.active_screen == ScreenId::Detail && self.deleting.is_some() {
                    self.action_tx.send(Action::GoBack)?;
                } else {
                    self.forward_to_active(action)?;
                }
            }

            // ── Modals ───────────────────────────────────────────────
            Action::OpenModal { kind, entity } => self.open_modal(*kind, entity),

            Action::OpenCreate(kind) => match self.services.coordinator.open_create(*kind) {
                Ok(_) => {
                    self.modal = Some(Modal::Form(FormModal::new(EditForm::blank(*kind), None)));
                }
                Err(e) => self.notify(Notification::info(e.to_string())),
            },

            Action::FormLoaded(loaded) => match (self.modal.take(), loaded) {
                (Some(Modal::Loading(entity)), Ok(form)) => {
                    self.modal = Some(Modal::Form(FormModal::new(form.clone(), Some(&entity))));
                }
                (Some(Modal::Loading(_)), Err(e)) => {
                    self.services.coordinator.close_modal();
                    self.notify(Notification::error(e.to_string()));
                }
                // Cancelled while loading
                (other, _) => self.modal = other,
            },

            Action::ModalChanged(state) => {
                if !state.is_open() {
                    self.modal = None;
                }
            }

            Action::MutationChanged(state) => {
                if let Some(modal) = self.modal.as_mut() {
                    modal.set_busy(state.is_loading);
                }
            }

            Action::SubmitForm(form) => {
                let coordinator = self.services.coordinator.clone();
                let form = form.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let settled = coordinator.submit_edit(&form).await;
                    let _ = tx.send(Action::ModalSettled(settled));
                });
            }

            Action::ConfirmDelete => {
                let coordinator = self.services.coordinator.clone();
                self.deleting = coordinator.state().entity().cloned();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let settled = coordinator.confirm_delete().await;
                    let _ = tx.send(Action::ModalSettled(settled));
                });
            }

            Action::CloseModal => {
                self.services.coordinator.close_modal();
                self.modal = None;
            }

            Action::ModalSettled(settled) => self.settle(settled),

            // ── Session ──────────────────────────────────────────────
            Action::LoggedIn => {
                self.switch_to(ScreenId::Users);
                self.previous_screen = None;
                self.notify(Notification::success("Logged in"));
            }

            Action::Logout => {
                if self.active_screen == ScreenId::Login {
                    return Ok(());
                }
                if let Err(e) = self.services.client.session().logout() {
                    warn!(error = %e, "could not clear stored token");
                }
                self.modal = None;
                self.services.coordinator.close_modal();
                self.switch_to(ScreenId::Login);
                self.previous_screen = None;
            }

            Action::Notify(n) => self.notify(n.clone()),
        }

        Ok(())
    }

    fn forward_to_active(&mut self, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Unmount the visible screen and mount `target`.
    fn switch_to(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.unmount();
        }
        self.previous_screen = Some(self.active_screen);
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&target) {
            screen.mount();
        }
    }

    fn open_modal(&mut self, kind: ModalKind, entity: &EntityRef) {
        let opened =
            self.services
                .coordinator
                .open_modal(kind, entity.kind, entity.token.as_str());
        match opened {
            Ok(ModalState::ConfirmingDelete(entity)) => {
                self.modal = Some(Modal::Delete(DeleteModal::new(entity)));
            }
            Ok(ModalState::Editing(entity)) => {
                self.modal = Some(Modal::Loading(entity.clone()));
                self.load_form(entity);
            }
            Ok(ModalState::Closed | ModalState::Creating(_)) => {}
            Err(e) => self.notify(Notification::error(e.to_string())),
        }
    }

    /// Fetch the entity behind an edit and turn it into a form.
    fn load_form(&self, entity: EntityRef) {
        let client = self.services.client.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let loaded = fetch_form(&client, &entity).await;
            let _ = tx.send(Action::FormLoaded(loaded));
        });
    }

    fn settle(&mut self, settled: &Result<Settled, CoreError>) {
        let deleted = self.deleting.take();
        match settled {
            Ok(how) => {
                debug!(?how, "modal action settled");
                let message = match &deleted {
                    Some(entity) => format!("Deleted {} {}", entity.kind.singular(), entity.token),
                    None => "Saved".to_owned(),
                };
                self.notify(Notification::success(message));
            }
            Err(e) => {
                warn!(error = %e, "modal action failed");
                if let Some(modal) = self.modal.as_mut() {
                    modal.set_error(e);
                }
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        if self.active_screen == ScreenId::Login {
            if let Some(screen) = self.screens.get(&ScreenId::Login) {
                screen.render(frame, area);
            }
            if let Some((notif, _)) = &self.notification {
                render_notification(frame, area, notif);
            }
            return;
        }

        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if let Some(modal) = &self.modal {
            modal.render(frame, area);
        }
        if let Some((notif, _)) = &self.notification {
            render_notification(frame, area, notif);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for id in ScreenId::ALL {
            let style = if id == self.active_screen {
                theme::tab_active()
            } else {
                theme::tab_inactive()
            };
            spans.push(Span::styled(format!(" {} {} ", id.number(), id.label()), style));
            spans.push(Span::styled(" ", theme::key_hint()));
        }
        if self.active_screen == ScreenId::Detail {
            spans.push(Span::styled(" › Detail ", theme::tab_active()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let session = if self.services.client.session().is_authenticated() {
            Span::styled("● token", Style::default().fg(theme::GREEN))
        } else {
            Span::styled("○ no token", Style::default().fg(theme::RED))
        };
        let screen_hints = self
            .screens
            .get(&self.active_screen)
            .map_or("", |s| s.hints());

        let line = Line::from(vec![
            Span::raw(" "),
            session,
            Span::styled(format!(" │ {screen_hints}"), theme::key_hint()),
            Span::styled("  │ ? help  L logout  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// The entity behind an edit, as a prefilled form.
async fn fetch_form(client: &AdminClient, entity: &EntityRef) -> Result<EditForm, CoreError> {
    let normalized = client
        .fetch(&entity.kind.entity_endpoint(entity.id()), None)
        .await?;
    match normalized.data {
        Some(Payload::Single(value)) => EditForm::from_entity(entity.kind, &value),
        _ => Err(CoreError::Http {
            status: 404,
            message: format!("{} {} not found", entity.kind.singular(), entity.token),
        }),
    }
}

fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    #[allow(clippy::cast_possible_truncation)]
    let width = (notif.message.chars().count() as u16 + 6).clamp(20, 60);
    let height = 3u16;
    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2);
    let toast = Rect::new(area.x + x, area.y + y, width.min(area.width), height.min(area.height));

    let (color, icon) = match notif.level {
        NotificationLevel::Success => (theme::GREEN, "✓"),
        NotificationLevel::Error => (theme::RED, "✗"),
        NotificationLevel::Info => (theme::HEADING, "·"),
    };

    frame.render_widget(Clear, toast);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let inner = block.inner(toast);
    frame.render_widget(block, toast);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(notif.message.as_str(), theme::table_row()),
        ])),
        inner,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered(area, 58, 20);
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };
    let heading = |text: &'static str| Line::from(Span::styled(text, theme::title_style()));

    let lines = vec![
        heading("  Navigation"),
        entry("1-3", "Users / Subjects / Tasks"),
        entry("Tab", "Next listing"),
        entry("j/k ↑/↓", "Move between rows"),
        entry("h/l ←/→", "Move between columns"),
        entry("n/p", "Next / previous page"),
        entry("Enter", "Open detail"),
        entry("Esc", "Back / close"),
        Line::from(""),
        heading("  Table"),
        entry("s", "Sort column (asc, desc, off)"),
        entry("f", "Filter column (Tab: relation)"),
        entry("c", "Clear filters"),
        entry("r", "Reload"),
        Line::from(""),
        heading("  Actions"),
        entry("e / d / a", "Edit / delete / add"),
        entry("L", "Log out"),
        entry("q", "Quit"),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
