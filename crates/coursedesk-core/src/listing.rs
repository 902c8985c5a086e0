// ── Listing screen ──
//
// One entity kind's table: state store, fetch query, filter discipline and
// page size. Mounting registers the listing's refetch with the action
// coordinator; unmounting cancels pending fetches and deregisters.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use coursedesk_api::{AdminClient, ListQuery};

use crate::config::FilterDiscipline;
use crate::coordinator::{ActionCoordinator, RefetchRegistration};
use crate::fetch::{FetchRequest, FetchResult, Query};
use crate::model::EntityKind;
use crate::mutate::Mutator;
use crate::stream::StateStream;
use crate::table::{Location, TableState, TableStatePatch, TableStateStore};
use crate::view::TableView;

pub struct Listing {
    kind: EntityKind,
    client: AdminClient,
    discipline: FilterDiscipline,
    page_size: u32,
    store: TableStateStore,
    query: Query,
    registration: Option<RefetchRegistration>,
}

impl Listing {
    /// A listing for `kind`, seeded from `location` when given.
    pub fn new(
        kind: EntityKind,
        client: AdminClient,
        discipline: FilterDiscipline,
        page_size: u32,
        location: Option<Arc<dyn Location>>,
    ) -> Self {
        let store = match location {
            Some(location) => TableStateStore::bound(kind.default_sorters(), location),
            None => TableStateStore::new(kind.default_sorters()),
        };
        let query = Query::new(client.clone());
        Self {
            kind,
            client,
            discipline,
            page_size: page_size.max(1),
            store,
            query,
            registration: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn discipline(&self) -> FilterDiscipline {
        self.discipline
    }

    pub fn store(&self) -> &TableStateStore {
        &self.store
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn is_mounted(&self) -> bool {
        self.registration.is_some()
    }

    /// Register this listing's refetch with `coordinator`. A listing that
    /// was unmounted gets a fresh query.
    pub fn mount(&mut self, coordinator: &ActionCoordinator) {
        if self.query.is_cancelled() {
            self.query = Query::new(self.client.clone());
        }
        let query = self.query.clone();
        self.registration = Some(coordinator.register_refetch(Arc::new(move || {
            query.spawn_refetch();
        })));
        debug!(kind = %self.kind, "listing mounted");
    }

    /// Also refetch when writes outside the coordinator touch this kind.
    pub fn follow(&self, mutator: &Mutator) -> JoinHandle<()> {
        self.query
            .follow_invalidations(self.kind, mutator.invalidations())
    }

    /// Stop pending fetches from writing state and drop the registration.
    pub fn unmount(&mut self) {
        self.query.cancel();
        self.registration = None;
        debug!(kind = %self.kind, "listing unmounted");
    }

    /// The request the current table state calls for.
    pub fn request(&self) -> FetchRequest {
        let state = self.store.state();
        let mut query = ListQuery::paged(state.page, self.page_size);
        let server_filtered = match self.discipline {
            FilterDiscipline::Server => {
                query.filters = state.filters;
                query.sorters = state.sorters;
                true
            }
            FilterDiscipline::Client => false,
        };
        FetchRequest::new(self.kind.endpoint()).with_query(query, server_filtered)
    }

    pub async fn load(&self) -> FetchResult {
        self.query.fetch(self.request()).await
    }

    /// Update the table state and fetch what it now calls for.
    pub async fn apply(&self, patch: TableStatePatch) -> FetchResult {
        self.store.update(patch);
        self.load().await
    }

    pub fn spawn_load(&self) -> JoinHandle<FetchResult> {
        self.query.spawn_fetch(self.request())
    }

    pub fn spawn_apply(&self, patch: TableStatePatch) -> JoinHandle<FetchResult> {
        self.store.update(patch);
        self.spawn_load()
    }

    pub fn state(&self) -> TableState {
        self.store.state()
    }

    pub fn result(&self) -> FetchResult {
        self.query.result()
    }

    pub fn subscribe(&self) -> StateStream<FetchResult> {
        self.query.subscribe()
    }

    pub fn view(&self) -> TableView {
        TableView::build(self.kind, &self.store.state(), &self.query.result())
    }
}

impl Drop for Listing {
    fn drop(&mut self) {
        self.query.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_api::{FilterRule, Session, SortRule};
    use pretty_assertions::assert_eq;
    use url::Url;

    use crate::table::MemoryLocation;

    fn client() -> AdminClient {
        AdminClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9").unwrap(),
            Session::ephemeral(),
        )
    }

    #[test]
    fn server_discipline_sends_everything() {
        let location = MemoryLocation::parse("/users?page=2&filters=name:contains:an");
        let listing = Listing::new(
            EntityKind::Users,
            client(),
            FilterDiscipline::Server,
            25,
            Some(Arc::new(location)),
        );
        let request = listing.request();
        assert_eq!(request.endpoint, "/admin/users");
        assert!(request.server_filtered);

        let query = request.query.unwrap();
        assert_eq!(query, ListQuery {
            page: Some(coursedesk_api::PageRequest { page: 2, page_size: 25 }),
            filters: vec![FilterRule::contains("name", "an")],
            sorters: vec![SortRule::asc("id")],
        });
    }

    #[test]
    fn client_discipline_sends_only_paging() {
        let listing = Listing::new(EntityKind::Tasks, client(), FilterDiscipline::Client, 10, None);
        listing.store().update(TableStatePatch::sorters(vec![SortRule::desc("title")]));
        let request = listing.request();
        assert!(!request.server_filtered);
        assert_eq!(request.query.unwrap(), ListQuery::paged(1, 10));
    }

    #[test]
    fn mount_and_unmount_manage_the_registration() {
        let coordinator = ActionCoordinator::new(Mutator::new(client()));
        let mut listing = Listing::new(EntityKind::Subjects, client(), FilterDiscipline::Server, 10, None);

        listing.mount(&coordinator);
        assert!(coordinator.has_registration());
        listing.unmount();
        assert!(!coordinator.has_registration());
        assert!(listing.query().is_cancelled());

        listing.mount(&coordinator);
        assert!(!listing.query().is_cancelled());
    }
}
