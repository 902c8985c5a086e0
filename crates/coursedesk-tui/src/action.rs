//! All possible UI actions. Actions are the sole mechanism for state mutation.

use coursedesk_core::{
    CoreError, EditForm, EntityKind, EntityRef, FetchResult, ModalKind, ModalState, MutationState,
    Settled,
};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,

    // ── Navigation ──
    SwitchScreen(ScreenId),
    GoBack,
    ToggleHelp,
    /// Follow a row's navigate action (`/users/<token>`).
    Navigate(String),

    // ── Data ──
    ListingUpdated(EntityKind, FetchResult),
    DetailLoaded(EntityRef, FetchResult),
    /// Full refresh of whatever is on screen.
    Reload,

    // ── Modals ──
    OpenModal { kind: ModalKind, entity: EntityRef },
    OpenCreate(EntityKind),
    /// Entity fetched for the edit form.
    FormLoaded(Result<EditForm, CoreError>),
    ModalChanged(ModalState),
    MutationChanged(MutationState),
    SubmitForm(EditForm),
    ConfirmDelete,
    CloseModal,
    ModalSettled(Result<Settled, CoreError>),

    // ── Session ──
    LoggedIn,
    Logout,

    // ── Notifications ──
    Notify(Notification),
}
