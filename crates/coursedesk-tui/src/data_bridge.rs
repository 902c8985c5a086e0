//! Data bridges: forward watch-backed core state to TUI actions.
//!
//! Each bridge runs as a background task, pushes the current snapshot, then
//! forwards every change as an [`Action`] until cancelled or until the
//! source is dropped.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use coursedesk_core::{ActionCoordinator, EntityKind, FetchResult, StateStream};

use crate::action::Action;

/// Forward one listing's fetch results.
pub async fn listing_bridge(
    kind: EntityKind,
    mut results: StateStream<FetchResult>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::ListingUpdated(kind, results.current().clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = results.changed() => {
                let Some(result) = changed else { break };
                if action_tx.send(Action::ListingUpdated(kind, result)).is_err() {
                    break;
                }
            }
        }
    }

    debug!(%kind, "listing bridge stopped");
}

/// Forward modal and mutation state from the coordinator.
///
/// Subscribes before returning so no transition between the call and the
/// first poll is missed.
pub fn coordinator_bridge(
    coordinator: &ActionCoordinator,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) -> impl Future<Output = ()> + Send + 'static {
    let mut modal = coordinator.subscribe();
    let mut mutation = coordinator.mutator().subscribe();

    async move {
        loop {
            let action = tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                Some(state) = modal.changed() => Action::ModalChanged(state),

                Some(state) = mutation.changed() => Action::MutationChanged(state),

                else => break,
            };
            if action_tx.send(action).is_err() {
                break;
            }
        }

        debug!("coordinator bridge stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_core::{ClientConfig, ModalKind, ModalState, Mutator, Session};
    use url::Url;

    fn coordinator() -> ActionCoordinator {
        let client = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
            .connect(Session::ephemeral())
            .unwrap();
        ActionCoordinator::new(Mutator::new(client))
    }

    #[tokio::test]
    async fn modal_changes_become_actions() {
        let coordinator = coordinator();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(coordinator_bridge(&coordinator, tx, cancel.clone()));

        coordinator.open_modal(ModalKind::Delete, EntityKind::Subjects, "NDI=").unwrap();
        match rx.recv().await.unwrap() {
            Action::ModalChanged(ModalState::ConfirmingDelete(entity)) => {
                assert_eq!(entity.id(), 42);
            }
            other => panic!("unexpected action {other:?}"),
        }

        cancel.cancel();
        task.await.unwrap();
    }
}
