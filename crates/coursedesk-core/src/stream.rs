// ── Reactive state streams ──
//
// Subscription type for consuming state changes from watch-backed stores
// (table state, fetch results, mutation state, modal state).

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to a single observable value.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct StateStream<T: Clone + Send + Sync + 'static> {
    current: T,
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> StateStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<T>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The value seen at creation time or at the last [`changed()`](Self::changed).
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The latest value (may have changed since the last poll).
    pub fn latest(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Whether a change arrived that [`changed()`](Self::changed) has not
    /// yet consumed.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change, returning the new value.
    /// Returns `None` once the owning store is dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        let value = self.receiver.borrow_and_update().clone();
        self.current = value.clone();
        Some(value)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current value first, then every change.
    pub fn into_stream(self) -> WatchStream<T> {
        WatchStream::new(self.receiver)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn changed_tracks_latest() {
        let (tx, rx) = watch::channel(1);
        let mut stream = StateStream::new(rx);
        assert_eq!(*stream.current(), 1);

        tx.send_replace(2);
        assert_eq!(stream.changed().await, Some(2));
        assert_eq!(*stream.current(), 2);

        drop(tx);
        assert_eq!(stream.changed().await, None);
    }

    #[tokio::test]
    async fn into_stream_yields_current_then_changes() {
        let (tx, rx) = watch::channel("a");
        let mut stream = StateStream::new(rx).into_stream();
        assert_eq!(stream.next().await, Some("a"));
        tx.send_replace("b");
        assert_eq!(stream.next().await, Some("b"));
    }
}
