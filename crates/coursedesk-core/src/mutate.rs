// ── Mutations ──
//
// Writes go through a `Mutator`, which tracks loading/error state and
// announces which entity family a successful write touched so queries
// following that family can refetch.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use coursedesk_api::{AdminClient, Mutation};

use crate::error::CoreError;
use crate::model::EntityKind;
use crate::stream::StateStream;

const INVALIDATION_CHANNEL_SIZE: usize = 16;

/// Observable state of the most recent mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationState {
    pub is_loading: bool,
    pub error: Option<CoreError>,
}

/// Cheaply cloneable mutation runner.
#[derive(Clone)]
pub struct Mutator {
    inner: Arc<MutatorInner>,
}

struct MutatorInner {
    client: AdminClient,
    state: watch::Sender<MutationState>,
    invalidations: broadcast::Sender<EntityKind>,
}

impl Mutator {
    pub fn new(client: AdminClient) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_SIZE);
        Self {
            inner: Arc::new(MutatorInner {
                client,
                state,
                invalidations,
            }),
        }
    }

    pub fn client(&self) -> &AdminClient {
        &self.inner.client
    }

    /// Send one write. On success the written family is invalidated; on
    /// failure nothing local changes besides the recorded error.
    pub async fn mutate(&self, mutation: &Mutation) -> Result<Value, CoreError> {
        self.inner.state.send_replace(MutationState {
            is_loading: true,
            error: None,
        });

        match self.inner.client.mutate(mutation).await {
            Ok(body) => {
                self.inner.state.send_replace(MutationState::default());
                info!(
                    method = mutation.method.as_str(),
                    endpoint = %mutation.endpoint,
                    "mutation succeeded"
                );
                if let Some(kind) = EntityKind::from_endpoint(&mutation.endpoint) {
                    // No receivers is fine: nothing is following this family.
                    let receivers = self.inner.invalidations.send(kind).unwrap_or(0);
                    debug!(%kind, receivers, "invalidation published");
                }
                Ok(body)
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(endpoint = %mutation.endpoint, error = %err, "mutation failed");
                self.inner.state.send_replace(MutationState {
                    is_loading: false,
                    error: Some(err.clone()),
                });
                Err(err)
            }
        }
    }

    /// Send writes in order, stopping at the first failure.
    pub async fn mutate_all(&self, mutations: &[Mutation]) -> Result<Vec<Value>, CoreError> {
        let mut bodies = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            bodies.push(self.mutate(mutation).await?);
        }
        Ok(bodies)
    }

    pub fn state(&self) -> MutationState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<MutationState> {
        StateStream::new(self.inner.state.subscribe())
    }

    /// Families touched by successful writes, from now on.
    pub fn invalidations(&self) -> broadcast::Receiver<EntityKind> {
        self.inner.invalidations.subscribe()
    }
}
