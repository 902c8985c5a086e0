// Bearer-token session shared by every request the client sends.
//
// The session is injected rather than global: the CLI and TUI build one at
// startup from durable storage and hand clones to whoever needs it.

use std::sync::{Arc, Mutex};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::debug;

use crate::Error;

// ── Durable storage ─────────────────────────────────────────────────

/// Durable storage for the bearer token.
///
/// Implemented by the keyring store in `coursedesk-config`; the in-memory
/// store here backs tests and env-var overrides.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SecretString>, Error>;
    fn save(&self, token: &SecretString) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

/// Process-local token storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SecretString) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<SecretString>>, Error> {
        self.slot
            .lock()
            .map_err(|_| Error::TokenStorage("in-memory token store poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        *self.lock()? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.lock()? = None;
        Ok(())
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// Cheaply cloneable handle to the current bearer token.
///
/// Subscribers are notified through a `watch` channel on login and logout.
/// Requests read the token once when they are built, so a logout while a
/// request is in flight does not affect that request.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    token: watch::Sender<Option<SecretString>>,
}

impl Session {
    /// Open a session over `store`, reading any persisted token.
    pub fn new(store: impl TokenStore + 'static) -> Result<Self, Error> {
        let initial = store.load()?;
        debug!(authenticated = initial.is_some(), "session opened");
        let (token, _) = watch::channel(initial);
        Ok(Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                token,
            }),
        })
    }

    /// A session with no durable storage and no token.
    pub fn ephemeral() -> Self {
        let (token, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(MemoryTokenStore::new()),
                token,
            }),
        }
    }

    /// A session with no durable storage, pre-authenticated with `token`.
    pub fn with_token(token: SecretString) -> Self {
        let (sender, _) = watch::channel(Some(token.clone()));
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(MemoryTokenStore::with_token(token)),
                token: sender,
            }),
        }
    }

    /// Persist `token` and make it current.
    ///
    /// If persisting fails the session is left unchanged.
    pub fn login(&self, token: SecretString) -> Result<(), Error> {
        if token.expose_secret().trim().is_empty() {
            return Err(Error::InvalidInput("token must not be empty".into()));
        }
        self.inner.store.save(&token)?;
        self.inner.token.send_replace(Some(token));
        debug!("session token stored");
        Ok(())
    }

    /// Forget the token in memory and in durable storage.
    ///
    /// The in-memory token is cleared even when the storage fails.
    pub fn logout(&self) -> Result<(), Error> {
        self.inner.token.send_replace(None);
        debug!("session token cleared");
        self.inner.store.clear()
    }

    pub fn current_token(&self) -> Option<SecretString> {
        self.inner.token.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.borrow().is_some()
    }

    /// Observe login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<SecretString>> {
        self.inner.token.subscribe()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn login_persists_and_logout_clears() {
        let session = Session::new(MemoryTokenStore::new()).unwrap();
        assert!(!session.is_authenticated());

        session.login("abc".to_string().into()).unwrap();
        assert_eq!(session.current_token().unwrap().expose_secret(), "abc");

        session.logout().unwrap();
        assert!(session.current_token().is_none());
    }

    #[test]
    fn persisted_token_is_read_at_startup() {
        let store = MemoryTokenStore::with_token("persisted".to_string().into());
        let session = Session::new(store).unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn empty_token_is_rejected() {
        let session = Session::ephemeral();
        assert!(matches!(
            session.login("  ".to_string().into()),
            Err(Error::InvalidInput(_))
        ));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn subscribers_see_transitions() {
        let session = Session::ephemeral();
        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.login("abc".to_string().into()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());

        session.logout().unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    struct FailingStore;

    impl TokenStore for FailingStore {
        fn load(&self) -> Result<Option<SecretString>, Error> {
            Ok(None)
        }
        fn save(&self, _token: &SecretString) -> Result<(), Error> {
            Err(Error::TokenStorage("locked".into()))
        }
        fn clear(&self) -> Result<(), Error> {
            Err(Error::TokenStorage("locked".into()))
        }
    }

    #[test]
    fn failed_save_leaves_session_unchanged() {
        let session = Session::new(FailingStore).unwrap();
        assert!(session.login("abc".to_string().into()).is_err());
        assert!(!session.is_authenticated());
    }
}
