// ── Table view model ──
//
// Declarative description of what a listing shows: columns, rendered rows,
// row actions, paging and the active filter/sort. Front-ends draw it and
// feed user input back through the patch-producing methods.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use coursedesk_api::{FilterRule, Pagination, Relation, SortOrder, SortRule};

use crate::coordinator::{EntityRef, ModalKind};
use crate::error::CoreError;
use crate::fetch::FetchResult;
use crate::model::{EntityKind, EntityToken, encode};
use crate::table::{TableState, TableStatePatch, cell_text, process};

/// How a cell is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Number,
    /// Shown as `YYYY-MM-DD` when parseable.
    Date,
    /// Colored badge.
    Status,
    /// First letter of the row's `name`.
    Initial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: &'static str,
    pub caption: &'static str,
    pub kind: CellKind,
    pub sortable: bool,
    pub filterable: bool,
}

impl Column {
    pub fn new(id: &'static str, caption: &'static str, kind: CellKind) -> Self {
        Self {
            id,
            caption,
            kind,
            sortable: false,
            filterable: false,
        }
    }

    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }
}

/// What selecting a row action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    /// Go to the entity's detail route.
    Navigate,
    Modal(ModalKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAction {
    pub id: &'static str,
    pub title: String,
    pub target: ActionTarget,
}

/// Result of activating a row action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDispatch {
    Navigate { route: String },
    OpenModal { kind: ModalKind, entity: EntityRef },
}

/// Semantic color of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Green,
    Orange,
    Purple,
    Violet,
    Red,
    Blue,
    Neutral,
}

impl StatusTone {
    pub fn of(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "approved" | "active" => Self::Green,
            "pending" | "inactive" => Self::Orange,
            "admin" => Self::Purple,
            "trainee" | "user" => Self::Violet,
            "rejected" => Self::Red,
            "moderator" => Self::Blue,
            _ => Self::Neutral,
        }
    }
}

/// One row ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    /// `None` when the row carries no usable `id`.
    pub token: Option<EntityToken>,
    /// Display text, one per column.
    pub cells: Vec<String>,
    pub raw: Value,
}

// ── View ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub kind: EntityKind,
    pub columns: Vec<Column>,
    pub actions: Vec<RowAction>,
    pub rows: Vec<RenderedRow>,
    pub state: TableState,
    pub pagination: Option<Pagination>,
    /// Overlay flag; the rendered rows stay interactive.
    pub is_loading: bool,
    pub error: Option<CoreError>,
}

impl TableView {
    /// Build the view for `kind` from its table state and latest fetch.
    /// Rows not yet filtered by the server are post-processed here.
    pub fn build(kind: EntityKind, state: &TableState, result: &FetchResult) -> Self {
        let columns = kind.columns();
        let raw_rows = if result.server_filtered {
            result.rows().to_vec()
        } else {
            process(result.rows(), &state.filters, &state.sorters)
        };
        let rows = raw_rows
            .into_iter()
            .map(|raw| RenderedRow {
                token: row_token(&raw),
                cells: columns.iter().map(|c| render_cell(c, &raw)).collect(),
                raw,
            })
            .collect();

        Self {
            kind,
            columns,
            actions: kind.row_actions(),
            rows,
            state: state.clone(),
            pagination: result.pagination,
            is_loading: result.is_loading,
            error: result.error.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn empty_message(&self) -> String {
        self.kind.empty_message()
    }

    pub fn current_page(&self) -> u32 {
        self.pagination.map_or(self.state.page, |p| p.current_page)
    }

    pub fn last_page(&self) -> u32 {
        self.pagination.map_or(1, |p| p.last_page.max(1))
    }

    pub fn total_records(&self) -> u64 {
        self.pagination
            .map_or(self.rows.len() as u64, |p| p.total_count)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    // ── State changes ────────────────────────────────────────────────

    /// Cycle a column through ascending, descending and unsorted. A newly
    /// sorted column becomes the primary key; the rest break ties in their
    /// existing order. `None` for unsortable columns.
    pub fn toggle_sort(&self, column: &str) -> Option<TableStatePatch> {
        if !self.column(column)?.sortable {
            return None;
        }
        let mut sorters = self.state.sorters.clone();
        match sorters.iter().position(|s| s.column == column) {
            None => sorters.insert(0, SortRule::asc(column)),
            Some(i) if sorters[i].order == SortOrder::Asc => sorters[i].order = SortOrder::Desc,
            Some(i) => {
                sorters.remove(i);
            }
        }
        Some(TableStatePatch::sorters(sorters))
    }

    /// Replace the filter on `column`; an empty value removes it. Jumps
    /// back to page 1. `None` for unfilterable columns.
    pub fn set_filter(
        &self,
        column: &str,
        relation: Relation,
        value: &str,
    ) -> Option<TableStatePatch> {
        if !self.column(column)?.filterable {
            return None;
        }
        let mut filters: Vec<FilterRule> = self
            .state
            .filters
            .iter()
            .filter(|f| f.column != column)
            .cloned()
            .collect();
        if !value.is_empty() {
            let rule = FilterRule::new(column, relation, value);
            match self.state.filters.iter().position(|f| f.column == column) {
                Some(i) => filters.insert(i.min(filters.len()), rule),
                None => filters.push(rule),
            }
        }
        Some(TableStatePatch::filters(filters).with_page(1))
    }

    pub fn clear_filters(&self) -> TableStatePatch {
        TableStatePatch::filters(Vec::new()).with_page(1)
    }

    /// Clamped to the known page range.
    pub fn go_to_page(&self, page: u32) -> TableStatePatch {
        TableStatePatch::page(page.clamp(1, self.last_page()))
    }

    pub fn next_page(&self) -> Option<TableStatePatch> {
        let page = self.current_page();
        (page < self.last_page()).then(|| TableStatePatch::page(page + 1))
    }

    pub fn prev_page(&self) -> Option<TableStatePatch> {
        let page = self.current_page();
        (page > 1).then(|| TableStatePatch::page(page - 1))
    }

    /// Resolve `action_id` on row `index`.
    pub fn activate(&self, index: usize, action_id: &str) -> Result<ActionDispatch, CoreError> {
        let row = self
            .rows
            .get(index)
            .ok_or_else(|| CoreError::InvalidInput(format!("no row at index {index}")))?;
        let action = self
            .actions
            .iter()
            .find(|a| a.id == action_id)
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown action {action_id:?}")))?;
        let token = row.token.clone().ok_or_else(|| {
            CoreError::InvalidState(format!("{} row has no id", self.kind.singular()))
        })?;

        Ok(match action.target {
            ActionTarget::Navigate => ActionDispatch::Navigate {
                route: format!("/{}/{token}", self.kind.family()),
            },
            ActionTarget::Modal(kind) => ActionDispatch::OpenModal {
                kind,
                entity: EntityRef::new(self.kind, token),
            },
        })
    }
}

fn row_token(row: &Value) -> Option<EntityToken> {
    match row.get("id")? {
        Value::Number(n) => n.as_u64().map(encode),
        Value::String(s) => s.parse::<u64>().ok().map(encode),
        _ => None,
    }
}

/// Display text for one cell. Never fails; unknown values render empty.
pub fn render_cell(column: &Column, row: &Value) -> String {
    match column.kind {
        CellKind::Text | CellKind::Number | CellKind::Status => cell_text(row.get(column.id)),
        CellKind::Date => format_date(&cell_text(row.get(column.id))),
        CellKind::Initial => cell_text(row.get("name"))
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default(),
    }
}

/// `YYYY-MM-DD` for RFC 3339, `datetime-local` and plain dates; anything
/// else is returned as is.
pub fn format_date(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().to_string();
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return dt.date().to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.to_string();
    }
    raw.to_owned()
}
