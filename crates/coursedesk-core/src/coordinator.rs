// ── Action coordinator ──
//
// Bridges the modal host and whichever listing is on screen. The listing
// registers its refetch on mount and holds the returned guard; the modal
// only talks to the coordinator. After a successful delete or edit the
// coordinator closes the modal and runs the registered refetch, or the
// reload hook when no listing is registered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use coursedesk_api::Mutation;

use crate::error::CoreError;
use crate::forms::EditForm;
use crate::model::{EntityKind, EntityToken};
use crate::mutate::Mutator;
use crate::stream::StateStream;

/// Callback run after a successful modal action.
pub type RefreshFn = Arc<dyn Fn() + Send + Sync>;

/// Which modal a row action opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModalKind {
    Edit,
    Delete,
}

/// The entity a modal operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub token: EntityToken,
}

impl EntityRef {
    pub fn new(kind: EntityKind, token: EntityToken) -> Self {
        Self { kind, token }
    }

    pub fn id(&self) -> u64 {
        self.token.id()
    }
}

/// Modal state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    ConfirmingDelete(EntityRef),
    Editing(EntityRef),
    /// Blank form for a new entity.
    Creating(EntityKind),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        match self {
            Self::ConfirmingDelete(entity) | Self::Editing(entity) => Some(entity),
            Self::Closed | Self::Creating(_) => None,
        }
    }
}

/// How a successful modal action was followed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The registered listing refetched.
    Refetched,
    /// No listing was registered; the reload hook ran.
    Reloaded,
    /// Neither a listing nor a reload hook was available.
    Unhandled,
}

// ── Coordinator ──────────────────────────────────────────────────────

/// Cheaply cloneable; clones share modal state and registrations.
#[derive(Clone)]
pub struct ActionCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    mutator: Mutator,
    state: watch::Sender<ModalState>,
    next_registration: AtomicU64,
    refetch: Mutex<Option<(u64, RefreshFn)>>,
    reload: Mutex<Option<RefreshFn>>,
}

impl ActionCoordinator {
    pub fn new(mutator: Mutator) -> Self {
        let (state, _) = watch::channel(ModalState::Closed);
        Self {
            inner: Arc::new(CoordinatorInner {
                mutator,
                state,
                next_registration: AtomicU64::new(1),
                refetch: Mutex::new(None),
                reload: Mutex::new(None),
            }),
        }
    }

    pub fn mutator(&self) -> &Mutator {
        &self.inner.mutator
    }

    /// Full-refresh fallback used when no listing is registered.
    pub fn set_reload_hook(&self, hook: RefreshFn) {
        *lock(&self.inner.reload) = Some(hook);
    }

    // ── Modal transitions ────────────────────────────────────────────

    /// Open the edit or delete modal for the entity behind `token`.
    pub fn open_modal(
        &self,
        kind: ModalKind,
        entity_kind: EntityKind,
        token: &str,
    ) -> Result<ModalState, CoreError> {
        let entity = EntityRef::new(entity_kind, token.parse()?);
        let next = match kind {
            ModalKind::Edit => ModalState::Editing(entity),
            ModalKind::Delete => ModalState::ConfirmingDelete(entity),
        };
        debug!(?next, "modal opened");
        self.inner.state.send_replace(next.clone());
        Ok(next)
    }

    /// Open a blank create form. Users are not creatable.
    pub fn open_create(&self, kind: EntityKind) -> Result<ModalState, CoreError> {
        if !kind.supports_create() {
            return Err(CoreError::InvalidState(format!(
                "{} cannot be created from the console",
                kind.family()
            )));
        }
        let next = ModalState::Creating(kind);
        self.inner.state.send_replace(next.clone());
        Ok(next)
    }

    pub fn close_modal(&self) {
        self.inner.state.send_if_modified(|state| {
            let was_open = state.is_open();
            *state = ModalState::Closed;
            was_open
        });
    }

    /// Delete the entity under confirmation. On failure the modal stays
    /// open and the error is returned for inline display.
    pub async fn confirm_delete(&self) -> Result<Settled, CoreError> {
        let ModalState::ConfirmingDelete(entity) = self.state() else {
            return Err(CoreError::InvalidState(
                "no delete is awaiting confirmation".into(),
            ));
        };

        let mutation = Mutation::delete(entity.kind.family(), entity.id());
        self.inner.mutator.mutate(&mutation).await?;
        info!(kind = %entity.kind, token = %entity.token, "entity deleted");
        Ok(self.finish())
    }

    /// Persist `form` for the entity being edited (or created).
    pub async fn submit_edit(&self, form: &EditForm) -> Result<Settled, CoreError> {
        let id = match self.state() {
            ModalState::Editing(entity) if entity.kind == form.kind() => Some(entity.id()),
            ModalState::Creating(kind) if kind == form.kind() => None,
            ModalState::Editing(_) | ModalState::Creating(_) => {
                return Err(CoreError::InvalidState(format!(
                    "open modal does not edit {}",
                    form.kind().family()
                )));
            }
            ModalState::Closed | ModalState::ConfirmingDelete(_) => {
                return Err(CoreError::InvalidState("no edit form is open".into()));
            }
        };

        let mutations = form.mutations(id)?;
        self.inner.mutator.mutate_all(&mutations).await?;
        info!(kind = %form.kind(), ?id, "entity saved");
        Ok(self.finish())
    }

    // ── Refetch registration ─────────────────────────────────────────

    /// Make `refetch` the callback run after modal actions. The
    /// registration lasts until the returned guard is dropped.
    #[must_use = "dropping the registration deregisters the refetch immediately"]
    pub fn register_refetch(&self, refetch: RefreshFn) -> RefetchRegistration {
        let id = self.inner.next_registration.fetch_add(1, Ordering::Relaxed);
        let replaced = lock(&self.inner.refetch).replace((id, refetch));
        debug!(id, replaced = replaced.is_some(), "refetch registered");
        RefetchRegistration {
            id,
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn has_registration(&self) -> bool {
        lock(&self.inner.refetch).is_some()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn state(&self) -> ModalState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<ModalState> {
        StateStream::new(self.inner.state.subscribe())
    }

    fn finish(&self) -> Settled {
        self.inner.state.send_replace(ModalState::Closed);

        // Clone out so the callback runs without the lock held.
        let refetch = lock(&self.inner.refetch).as_ref().map(|(_, f)| Arc::clone(f));
        if let Some(refetch) = refetch {
            refetch();
            return Settled::Refetched;
        }
        let reload = lock(&self.inner.reload).clone();
        match reload {
            Some(reload) => {
                debug!("no listing registered, reloading");
                reload();
                Settled::Reloaded
            }
            None => Settled::Unhandled,
        }
    }
}

/// Keeps a listing's refetch registered while alive.
pub struct RefetchRegistration {
    id: u64,
    inner: Arc<CoordinatorInner>,
}

impl Drop for RefetchRegistration {
    fn drop(&mut self) {
        let mut slot = lock(&self.inner.refetch);
        if slot.as_ref().is_some_and(|(id, _)| *id == self.id) {
            *slot = None;
            debug!(id = self.id, "refetch deregistered");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use coursedesk_api::{AdminClient, Session};
    use url::Url;

    use crate::model::encode;

    fn coordinator() -> ActionCoordinator {
        let client = AdminClient::with_client(
            reqwest_client(),
            Url::parse("http://127.0.0.1:9").unwrap(),
            Session::ephemeral(),
        );
        ActionCoordinator::new(Mutator::new(client))
    }

    fn reqwest_client() -> reqwest::Client {
        reqwest::Client::new()
    }

    fn counter() -> (Arc<AtomicUsize>, RefreshFn) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn open_and_close() {
        let coordinator = coordinator();
        let token = encode(42);
        let state = coordinator
            .open_modal(ModalKind::Delete, EntityKind::Subjects, token.as_str())
            .unwrap();
        assert_eq!(
            state,
            ModalState::ConfirmingDelete(EntityRef::new(EntityKind::Subjects, token))
        );
        coordinator.close_modal();
        assert_eq!(coordinator.state(), ModalState::Closed);
    }

    #[test]
    fn bad_token_leaves_modal_closed() {
        let coordinator = coordinator();
        let err = coordinator
            .open_modal(ModalKind::Edit, EntityKind::Users, "not-valid")
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidToken(_)));
        assert_eq!(coordinator.state(), ModalState::Closed);
    }

    #[test]
    fn users_cannot_be_created() {
        let coordinator = coordinator();
        assert!(coordinator.open_create(EntityKind::Users).is_err());
        assert!(coordinator.open_create(EntityKind::Tasks).is_ok());
    }

    #[test]
    fn stale_guard_does_not_remove_newer_registration() {
        let coordinator = coordinator();
        let (_, first) = counter();
        let (count, second) = counter();

        let old = coordinator.register_refetch(first);
        let current = coordinator.register_refetch(second);
        drop(old);
        assert!(coordinator.has_registration());

        assert_eq!(coordinator.finish(), Settled::Refetched);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        drop(current);
        assert!(!coordinator.has_registration());
    }

    #[test]
    fn reload_hook_is_the_fallback() {
        let coordinator = coordinator();
        assert_eq!(coordinator.finish(), Settled::Unhandled);

        let (count, reload) = counter();
        coordinator.set_reload_hook(reload);
        assert_eq!(coordinator.finish(), Settled::Reloaded);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn confirm_requires_a_delete_modal() {
        let coordinator = coordinator();
        let err = coordinator.confirm_delete().await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }
}
