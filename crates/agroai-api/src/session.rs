// Session context: the bearer token and the user it belongs to.
//
// Lifecycle: read once at boot (`Session::restore`), set on login
// (`establish`), torn down on a 401 (`expire`) or on logout (`clear`).
// State changes are published on a watch channel so the sync layer can
// react to an expiry that happened deep inside a background poll.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::User;

/// What gets persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Persistence backend for [`StoredSession`].
pub trait SessionStore: Send + Sync {
    fn load(&self) -> io::Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> io::Result<Option<StoredSession>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token.
    Anonymous,
    /// Running on a configured guest token.
    Guest,
    /// Logged in with a user token.
    Authenticated,
    /// A request was rejected with 401; the token has been discarded.
    Expired,
}

impl SessionState {
    pub fn has_token(self) -> bool {
        matches!(self, Self::Guest | Self::Authenticated)
    }
}

struct SessionData {
    token: SecretString,
    user: Option<User>,
}

/// Shared, explicit session context handed to the API client.
pub struct Session {
    data: ArcSwapOption<SessionData>,
    state: watch::Sender<SessionState>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// An anonymous session backed by `store`. The store is not read.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            data: ArcSwapOption::empty(),
            state: watch::Sender::new(SessionState::Anonymous),
            store,
        }
    }

    /// An anonymous session with a process-local store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Read the persisted session once.
    ///
    /// Falls back to `guest_token` (not persisted) when nothing is stored.
    pub fn restore(store: Arc<dyn SessionStore>, guest_token: Option<SecretString>) -> Self {
        let session = Self::new(store);
        match session.store.load() {
            Ok(Some(stored)) => {
                debug!("restored persisted session");
                session.install(SecretString::from(stored.token), stored.user);
                session.state.send_replace(SessionState::Authenticated);
            }
            Ok(None) => {
                if let Some(token) = guest_token {
                    debug!("no stored session, using guest token");
                    session.install(token, None);
                    session.state.send_replace(SessionState::Guest);
                }
            }
            Err(e) => warn!(error = %e, "failed to read stored session"),
        }
        session
    }

    pub fn token(&self) -> Option<SecretString> {
        self.data.load().as_ref().map(|d| d.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.data.load().as_ref().and_then(|d| d.user.clone())
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().has_token()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Install a freshly issued token and persist it.
    pub fn establish(&self, token: SecretString, user: Option<User>) {
        use secrecy::ExposeSecret;

        let stored = StoredSession {
            token: token.expose_secret().to_owned(),
            user: user.clone(),
        };
        if let Err(e) = self.store.save(&stored) {
            warn!(error = %e, "failed to persist session");
        }
        self.install(token, user);
        info!("session established");
        self.state.send_replace(SessionState::Authenticated);
    }

    /// Discard the token after the backend rejected it.
    ///
    /// Subscribers are notified on the transition only; a 401 that lands
    /// after the session already expired changes nothing.
    pub fn expire(&self) {
        self.wipe();
        let transitioned = self.state.send_if_modified(|state| {
            if *state == SessionState::Expired {
                false
            } else {
                *state = SessionState::Expired;
                true
            }
        });
        if transitioned {
            warn!("session expired");
        }
    }

    /// Discard the token on explicit logout.
    pub fn clear(&self) {
        self.wipe();
        debug!("session cleared");
        self.state.send_replace(SessionState::Anonymous);
    }

    fn install(&self, token: SecretString, user: Option<User>) {
        self.data.store(Some(Arc::new(SessionData { token, user })));
    }

    fn wipe(&self) {
        self.data.store(None);
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear stored session");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn stored(token: &str) -> StoredSession {
        StoredSession {
            token: token.into(),
            user: None,
        }
    }

    #[test]
    fn restore_prefers_stored_token() {
        let store = Arc::new(MemorySessionStore::with_session(stored("abc")));
        let session = Session::restore(store, Some(SecretString::from("guest")));
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.token().unwrap().expose_secret(), "abc");
    }

    #[test]
    fn restore_falls_back_to_guest() {
        let store = Arc::new(MemorySessionStore::new());
        let session = Session::restore(store.clone(), Some(SecretString::from("guest")));
        assert_eq!(session.state(), SessionState::Guest);
        assert!(session.is_authenticated());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn expire_wipes_token_and_store() {
        let store = Arc::new(MemorySessionStore::new());
        let session = Session::new(store.clone());
        let mut rx = session.subscribe();
        session.establish(SecretString::from("t0k"), None);
        assert_eq!(store.load().unwrap().unwrap().token, "t0k");

        session.expire();
        assert!(session.token().is_none());
        assert!(store.load().unwrap().is_none());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Expired);
    }

    #[test]
    fn repeated_expiry_notifies_once() {
        let session = Session::in_memory();
        session.establish(SecretString::from("t0k"), None);
        let mut rx = session.subscribe();

        session.expire();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        session.expire();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(session.state(), SessionState::Expired);
    }

    #[test]
    fn clear_returns_to_anonymous() {
        let session = Session::in_memory();
        session.establish(SecretString::from("t0k"), None);
        session.clear();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(!session.is_authenticated());
    }
}
