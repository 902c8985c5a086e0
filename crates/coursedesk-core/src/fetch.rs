// ── Fetch queries ──
//
// A `Query` owns the observable result of one listing's data request.
// Overlapping fetches are last-request-wins: each fetch takes a generation
// number and only the newest generation may write the result. Cancelling
// the query (on unmount) stops in-flight requests from writing anything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use coursedesk_api::{AdminClient, ListQuery, Pagination, Payload};

use crate::error::CoreError;
use crate::model::EntityKind;
use crate::stream::StateStream;

// ── Result ───────────────────────────────────────────────────────────

/// Observable outcome of the most recent fetch.
///
/// Data from the previous fetch stays visible while a new one is in flight
/// and after a failed one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub data: Option<Payload>,
    pub pagination: Option<Pagination>,
    pub is_loading: bool,
    pub error: Option<CoreError>,
    /// `false` when rows still need client-side filtering and sorting.
    pub server_filtered: bool,
}

impl FetchResult {
    pub fn rows(&self) -> &[Value] {
        match &self.data {
            Some(payload) => payload.rows(),
            None => &[],
        }
    }
}

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub endpoint: String,
    pub query: Option<ListQuery>,
    pub server_filtered: bool,
}

impl FetchRequest {
    /// A plain `GET` of `endpoint` with no query.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: None,
            server_filtered: true,
        }
    }

    pub fn with_query(mut self, query: ListQuery, server_filtered: bool) -> Self {
        self.query = Some(query);
        self.server_filtered = server_filtered;
        self
    }
}

// ── Query ────────────────────────────────────────────────────────────

/// Cheaply cloneable handle to one fetch query.
#[derive(Clone)]
pub struct Query {
    inner: Arc<QueryInner>,
}

struct QueryInner {
    client: AdminClient,
    generation: AtomicU64,
    last_request: Mutex<Option<FetchRequest>>,
    result: watch::Sender<FetchResult>,
    cancel: CancellationToken,
}

impl Query {
    pub fn new(client: AdminClient) -> Self {
        let (result, _) = watch::channel(FetchResult::default());
        Self {
            inner: Arc::new(QueryInner {
                client,
                generation: AtomicU64::new(0),
                last_request: Mutex::new(None),
                result,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Issue `request` and return the result snapshot once it settles.
    ///
    /// If a newer fetch starts before this one resolves, this one's outcome
    /// is discarded and the returned snapshot reflects whatever the newest
    /// fetch has written so far.
    pub async fn fetch(&self, request: FetchRequest) -> FetchResult {
        if self.inner.cancel.is_cancelled() {
            return self.result();
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request_slot() = Some(request.clone());
        self.inner.result.send_modify(|r| r.is_loading = true);
        debug!(generation, endpoint = %request.endpoint, "fetch started");

        let outcome = tokio::select! {
            () = self.inner.cancel.cancelled() => {
                debug!(generation, "fetch cancelled");
                return self.result();
            }
            outcome = self.inner.client.fetch(&request.endpoint, request.query.as_ref()) => outcome,
        };

        let applied = self.inner.result.send_if_modified(|result| {
            if self.inner.cancel.is_cancelled()
                || self.inner.generation.load(Ordering::SeqCst) != generation
            {
                return false;
            }
            result.is_loading = false;
            match outcome {
                Ok(normalized) => {
                    result.data = normalized.data;
                    result.pagination = normalized.pagination;
                    result.error = None;
                    result.server_filtered = request.server_filtered;
                }
                Err(e) => {
                    let err = CoreError::from(e);
                    warn!(generation, error = %err, "fetch failed");
                    result.error = Some(err);
                }
            }
            true
        });

        if !applied {
            debug!(generation, "discarding superseded fetch result");
        }
        self.result()
    }

    /// Repeat the most recent request. `None` if nothing was fetched yet.
    pub async fn refetch(&self) -> Option<FetchResult> {
        let request = self.last_request()?;
        Some(self.fetch(request).await)
    }

    /// [`fetch`](Self::fetch) on a background task.
    pub fn spawn_fetch(&self, request: FetchRequest) -> JoinHandle<FetchResult> {
        let query = self.clone();
        tokio::spawn(async move { query.fetch(request).await })
    }

    /// [`refetch`](Self::refetch) on a background task.
    pub fn spawn_refetch(&self) -> JoinHandle<Option<FetchResult>> {
        let query = self.clone();
        tokio::spawn(async move { query.refetch().await })
    }

    /// Refetch whenever a mutation invalidates `kind`, until cancelled.
    pub fn follow_invalidations(
        &self,
        kind: EntityKind,
        mut invalidations: broadcast::Receiver<EntityKind>,
    ) -> JoinHandle<()> {
        let query = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    () = query.inner.cancel.cancelled() => break,

                    received = invalidations.recv() => match received {
                        Ok(invalidated) if invalidated == kind => {
                            debug!(%kind, "invalidated, refetching");
                            query.refetch().await;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            query.refetch().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    pub fn result(&self) -> FetchResult {
        self.inner.result.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<FetchResult> {
        StateStream::new(self.inner.result.subscribe())
    }

    pub fn last_request(&self) -> Option<FetchRequest> {
        self.last_request_slot().clone()
    }

    /// Stop in-flight and future fetches from writing results.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn last_request_slot(&self) -> MutexGuard<'_, Option<FetchRequest>> {
        self.inner
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
