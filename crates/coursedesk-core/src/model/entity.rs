// ── Entity kinds ──
//
// One dispatch table for the three administered entity families: where
// they live on the server, how they are routed locally, which columns
// and row actions their listing shows, and how they sort by default.

use serde::{Deserialize, Serialize};

use coursedesk_api::SortRule;

use crate::coordinator::ModalKind;
use crate::view::{ActionTarget, CellKind, Column, RowAction};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityKind {
    Users,
    Subjects,
    Tasks,
}

impl EntityKind {
    /// Plural family name used in endpoints and routes (`users`).
    pub fn family(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Subjects => "subjects",
            Self::Tasks => "tasks",
        }
    }

    /// Listing endpoint (`/admin/users`).
    pub fn endpoint(self) -> String {
        coursedesk_api::admin_path(self.family())
    }

    /// Single-entity endpoint (`/admin/users/7`).
    pub fn entity_endpoint(self, id: u64) -> String {
        coursedesk_api::admin_entity_path(self.family(), id)
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::Users => "user",
            Self::Subjects => "subject",
            Self::Tasks => "task",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Subjects => "Subjects",
            Self::Tasks => "Tasks",
        }
    }

    /// Name of the route parameter for a detail route (`userId`).
    pub fn param_key(self) -> &'static str {
        match self {
            Self::Users => "userId",
            Self::Subjects => "subjectId",
            Self::Tasks => "taskId",
        }
    }

    pub fn empty_message(self) -> String {
        format!("No {} found.", self.family())
    }

    /// Listing route (`/users`).
    pub fn route(self) -> String {
        format!("/{}", self.family())
    }

    /// Whether the admin API accepts `POST /admin/{family}`.
    pub fn supports_create(self) -> bool {
        !matches!(self, Self::Users)
    }

    pub fn default_sorters(self) -> Vec<SortRule> {
        match self {
            Self::Users => vec![SortRule::asc("id")],
            Self::Subjects | Self::Tasks => Vec::new(),
        }
    }

    pub fn columns(self) -> Vec<Column> {
        match self {
            Self::Users => vec![
                Column::new("id", "ID", CellKind::Number).sortable(),
                Column::new("avatar_url", "Avatar", CellKind::Initial),
                Column::new("name", "Name", CellKind::Text).sortable().filterable(),
                Column::new("email", "Email", CellKind::Text).sortable().filterable(),
                Column::new("role", "Role", CellKind::Status).sortable().filterable(),
                Column::new("status", "Status", CellKind::Status).sortable().filterable(),
                Column::new("created_at", "Created", CellKind::Date).sortable(),
            ],
            Self::Subjects => vec![
                Column::new("name", "Name", CellKind::Text).sortable().filterable(),
                Column::new("description", "Description", CellKind::Text).filterable(),
                Column::new("created_by_name", "Created By", CellKind::Text)
                    .sortable()
                    .filterable(),
            ],
            Self::Tasks => vec![
                Column::new("title", "Title", CellKind::Text).sortable().filterable(),
                Column::new("subject_name", "Subject", CellKind::Text)
                    .sortable()
                    .filterable(),
                Column::new("due_date", "Due Date", CellKind::Date).sortable(),
                Column::new("max_score", "Score", CellKind::Number).sortable(),
            ],
        }
    }

    pub fn row_actions(self) -> Vec<RowAction> {
        let family = self.family();
        vec![
            RowAction {
                id: "view",
                title: format!("View {family}"),
                target: ActionTarget::Navigate,
            },
            RowAction {
                id: "edit",
                title: format!("Edit {family}"),
                target: ActionTarget::Modal(ModalKind::Edit),
            },
            RowAction {
                id: "delete",
                title: format!("Delete {family}"),
                target: ActionTarget::Modal(ModalKind::Delete),
            },
        ]
    }

    /// Entity family of an admin endpoint (`/admin/users/7/role` -> `Users`).
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        let mut segments = endpoint.trim_start_matches('/').split('/');
        if segments.next()? != "admin" {
            return None;
        }
        let family = segments.next()?;
        let family = family.split(['?', '#']).next().unwrap_or(family);
        family.parse().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn endpoints_and_labels() {
        assert_eq!(EntityKind::Subjects.endpoint(), "/admin/subjects");
        assert_eq!(EntityKind::Tasks.entity_endpoint(3), "/admin/tasks/3");
        assert_eq!(EntityKind::Users.empty_message(), "No users found.");
        assert_eq!("Users".parse::<EntityKind>().unwrap(), EntityKind::Users);
    }

    #[test]
    fn family_from_endpoint() {
        assert_eq!(
            EntityKind::from_endpoint("/admin/users/7/role"),
            Some(EntityKind::Users)
        );
        assert_eq!(
            EntityKind::from_endpoint("/admin/tasks?page=2"),
            Some(EntityKind::Tasks)
        );
        assert_eq!(EntityKind::from_endpoint("/auth/login"), None);
        assert_eq!(EntityKind::from_endpoint("/admin/widgets"), None);
    }

    #[test]
    fn every_kind_has_view_edit_delete() {
        for kind in EntityKind::iter() {
            let ids: Vec<_> = kind.row_actions().iter().map(|a| a.id).collect();
            assert_eq!(ids, ["view", "edit", "delete"]);
            assert!(!kind.columns().is_empty());
        }
    }
}
