// ── Table state store ──
//
// Owns page/filter/sort for one listing. Every change goes through
// `update(patch)`, is broadcast on a watch channel, and is mirrored into
// the bound location (if any).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use coursedesk_api::{FilterRule, SortOrder, SortRule};

use super::location::{self, Location};
use crate::stream::StateStream;

/// Page, filters and sorters of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    /// 1-based.
    pub page: u32,
    pub filters: Vec<FilterRule>,
    /// Sequence order is the tie-break chain.
    pub sorters: Vec<SortRule>,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            page: 1,
            filters: Vec::new(),
            sorters: Vec::new(),
        }
    }
}

impl TableState {
    pub fn with_sorters(sorters: Vec<SortRule>) -> Self {
        Self {
            sorters,
            ..Self::default()
        }
    }

    /// Shallow merge: each field present in `patch` replaces ours wholesale.
    /// Page is clamped to 1, inert filters are dropped.
    pub fn apply(&mut self, patch: TableStatePatch) {
        if let Some(page) = patch.page {
            self.page = page.max(1);
        }
        if let Some(filters) = patch.filters {
            self.filters = filters.into_iter().filter(FilterRule::is_active).collect();
        }
        if let Some(sorters) = patch.sorters {
            self.sorters = sorters;
        }
    }

    pub fn filter_for(&self, column: &str) -> Option<&FilterRule> {
        self.filters.iter().find(|f| f.column == column)
    }

    pub fn sort_for(&self, column: &str) -> Option<SortOrder> {
        self.sorters
            .iter()
            .find(|s| s.column == column)
            .map(|s| s.order)
    }
}

/// Partial update for [`TableState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStatePatch {
    pub page: Option<u32>,
    pub filters: Option<Vec<FilterRule>>,
    pub sorters: Option<Vec<SortRule>>,
}

impl TableStatePatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn filters(filters: Vec<FilterRule>) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }

    pub fn sorters(sorters: Vec<SortRule>) -> Self {
        Self {
            sorters: Some(sorters),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.filters.is_none() && self.sorters.is_none()
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Observable table state, optionally mirrored into a [`Location`].
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct TableStateStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<TableState>,
    defaults: Vec<SortRule>,
    location: Option<Arc<dyn Location>>,
}

impl TableStateStore {
    /// Unbound store starting at page 1 with `defaults` as sorters.
    pub fn new(defaults: Vec<SortRule>) -> Self {
        let (state, _) = watch::channel(TableState::with_sorters(defaults.clone()));
        Self {
            inner: Arc::new(StoreInner {
                state,
                defaults,
                location: None,
            }),
        }
    }

    /// Store seeded from, and mirrored into, `location`.
    pub fn bound(defaults: Vec<SortRule>, location: Arc<dyn Location>) -> Self {
        let seeded = location::decode(&location.query(), &defaults);
        debug!(?seeded, "table state seeded from location");
        let (state, _) = watch::channel(seeded);
        Self {
            inner: Arc::new(StoreInner {
                state,
                defaults,
                location: Some(location),
            }),
        }
    }

    pub fn state(&self) -> TableState {
        self.inner.state.borrow().clone()
    }

    pub fn defaults(&self) -> &[SortRule] {
        &self.inner.defaults
    }

    /// Apply `patch` and return the resulting state.
    pub fn update(&self, patch: TableStatePatch) -> TableState {
        self.inner.state.send_if_modified(|state| {
            let before = state.clone();
            state.apply(patch);
            *state != before
        });
        let state = self.state();
        self.mirror(&state);
        state
    }

    /// Back to page 1, no filters, default sorters.
    pub fn reset(&self) -> TableState {
        self.update(TableStatePatch {
            page: Some(1),
            filters: Some(Vec::new()),
            sorters: Some(self.inner.defaults.clone()),
        })
    }

    pub fn subscribe(&self) -> StateStream<TableState> {
        StateStream::new(self.inner.state.subscribe())
    }

    fn mirror(&self, state: &TableState) {
        if let Some(location) = &self.inner.location {
            let query = location::merge(&location.query(), state, &self.inner.defaults);
            location.replace_query(&query);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::table::location::MemoryLocation;
    use pretty_assertions::assert_eq;

    #[test]
    fn update_is_a_shallow_merge() {
        let store = TableStateStore::new(vec![SortRule::asc("id")]);
        store.update(TableStatePatch::filters(vec![FilterRule::contains("name", "an")]));
        let state = store.update(TableStatePatch::page(3));

        assert_eq!(state.page, 3);
        assert_eq!(state.filters, vec![FilterRule::contains("name", "an")]);
        assert_eq!(state.sorters, vec![SortRule::asc("id")]);
    }

    #[test]
    fn page_is_clamped_and_inert_filters_dropped() {
        let store = TableStateStore::new(Vec::new());
        let state = store.update(TableStatePatch {
            page: Some(0),
            filters: Some(vec![FilterRule::contains("name", "")]),
            sorters: None,
        });
        assert_eq!(state.page, 1);
        assert!(state.filters.is_empty());
    }

    #[test]
    fn bound_store_seeds_and_mirrors() {
        let location = MemoryLocation::parse("/users?page=2&sorters=name:desc");
        let store = TableStateStore::bound(vec![SortRule::asc("id")], Arc::new(location.clone()));

        assert_eq!(store.state().page, 2);
        assert_eq!(store.state().sorters, vec![SortRule::desc("name")]);

        store.update(TableStatePatch::sorters(Vec::new()));
        assert_eq!(location.route(), "/users?page=2&sorters=");

        store.reset();
        assert_eq!(location.route(), "/users?page=1");
    }

    #[test]
    fn subscribers_only_see_real_changes() {
        let store = TableStateStore::new(Vec::new());
        let sub = store.subscribe();
        store.update(TableStatePatch::page(1));
        assert!(!sub.has_changed());
        store.update(TableStatePatch::page(2));
        assert!(sub.has_changed());
    }
}
