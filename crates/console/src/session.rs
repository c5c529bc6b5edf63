//! Session lifecycle and the authentication state machine.
//!
//! ```text
//! Initializing ──► Authenticated ──► Unauthenticated
//!      │                 ▲                │   ▲
//!      └─────────────────┼────────────────┘   │
//!                        └── Authenticating ◄─┘
//! ```
//!
//! The manager publishes a [`Session`] snapshot on a watch channel after
//! every transition. A cleared credential store (a 401 anywhere, or another
//! component logging out) moves an authenticated session to
//! `Unauthenticated` without going through [`SessionManager::logout`].

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::error::ApiError;
use crate::models::User;
use crate::notify::Notifier;
use crate::permissions;
use crate::services::AuthService;

const LOGIN_REJECTED_DESCRIPTION: &str = "Invalid email or password.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Reading and validating stored credentials.
    Initializing,
    /// A login request is in flight.
    Authenticating,
    Authenticated,
    Unauthenticated,
}

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    state: AuthState,
    user: Option<User>,
}

impl Session {
    const fn initializing() -> Self {
        Self {
            state: AuthState::Initializing,
            user: None,
        }
    }

    const fn unauthenticated() -> Self {
        Self {
            state: AuthState::Unauthenticated,
            user: None,
        }
    }

    const fn authenticated(user: User) -> Self {
        Self {
            state: AuthState::Authenticated,
            user: Some(user),
        }
    }

    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// The signed-in user. Always `None` unless authenticated.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(
            self.state,
            AuthState::Initializing | AuthState::Authenticating
        )
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated)
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        permissions::has_permission(self.user(), permission)
    }
}

/// Owns the session state machine.
///
/// Create with [`new`](Self::new), then either call
/// [`initialize`](Self::initialize) or [`start`](Self::start) once.
pub struct SessionManager {
    auth: AuthService,
    notifier: Notifier,
    state: watch::Sender<Session>,
}

impl SessionManager {
    #[must_use]
    pub fn new(auth: AuthService, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(Session::initializing());
        Self {
            auth,
            notifier,
            state,
        }
    }

    /// Run initialization and keep the session in sync with the credential
    /// store in a background task. The task ends when the manager is dropped
    /// and the store next changes.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let mut changes = self.auth.credentials().subscribe();

        tokio::spawn(async move {
            if let Some(this) = manager.upgrade() {
                this.initialize().await;
            }
            while changes.changed().await.is_ok() {
                let has_token = *changes.borrow_and_update();
                let Some(this) = manager.upgrade() else {
                    break;
                };
                if !has_token {
                    this.credentials_cleared();
                }
            }
            debug!("Session listener stopped");
        })
    }

    /// Resolve the initial state from stored credentials.
    ///
    /// A stored token is checked with the server; an invalid one is cleared.
    /// Does nothing unless the session is still `Initializing`.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        if self.state.borrow().state != AuthState::Initializing {
            return;
        }

        let next = match self.auth.current_user() {
            Some(user) => {
                if self.auth.validate_token().await {
                    info!(user_id = %user.id, "Restored session");
                    Session::authenticated(user)
                } else {
                    info!("Stored session is no longer valid");
                    self.auth.credentials().clear();
                    Session::unauthenticated()
                }
            }
            None => {
                if self.auth.is_authenticated() {
                    self.auth.credentials().clear();
                }
                Session::unauthenticated()
            }
        };

        self.state.send_if_modified(|session| {
            if session.state == AuthState::Initializing {
                *session = next;
                true
            } else {
                false
            }
        });
    }

    /// Wait for initialization to finish, then return the session.
    ///
    /// Waits forever if neither `initialize` nor `start` is ever called.
    pub async fn ready(&self) -> Session {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|session| session.state != AuthState::Initializing)
            .await;
        self.session()
    }

    /// Current session, reconciled against the credential store.
    #[must_use]
    pub fn session(&self) -> Session {
        if self.state.borrow().is_authenticated() && !self.auth.is_authenticated() {
            self.credentials_cleared();
        }
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Sign in.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthService::login`] error after publishing a failure
    /// notification.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, ApiError> {
        let previous = self.state.send_replace(Session {
            state: AuthState::Authenticating,
            user: None,
        });

        match self.auth.login(email, password).await {
            Ok(user) => {
                self.state.send_replace(Session::authenticated(user.clone()));
                self.notifier
                    .success("Login successful", format!("Welcome back, {}!", user.name));
                Ok(user)
            }
            Err(e) => {
                // A rejected login never touches the store, so an existing
                // session is still valid.
                let restored = match previous.user {
                    Some(user) if previous.state == AuthState::Authenticated
                        && self.auth.is_authenticated() =>
                    {
                        Session::authenticated(user)
                    }
                    _ => Session::unauthenticated(),
                };
                self.state.send_replace(restored);

                let description = match &e {
                    ApiError::InvalidCredentials(_) => LOGIN_REJECTED_DESCRIPTION.to_string(),
                    other => other.user_message(),
                };
                self.notifier.error("Login failed", description);
                Err(e)
            }
        }
    }

    /// Sign out. Always ends `Unauthenticated`, even if the server call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.auth.logout().await;
        self.state.send_replace(Session::unauthenticated());
        self.notifier
            .success("Logged out", "You have been successfully logged out.");
    }

    /// Advisory permission check against the current session.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.session().has_permission(permission)
    }

    fn credentials_cleared(&self) {
        let changed = self.state.send_if_modified(|session| {
            if session.state == AuthState::Authenticated {
                *session = Session::unauthenticated();
                true
            } else {
                false
            }
        });
        if changed {
            info!("Credentials cleared, session ended");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use miraki_core::{Email, Role, UserId};

    use super::*;
    use crate::config::ConsoleConfig;
    use crate::storage::CredentialStore;
    use crate::transport::HttpTransport;

    fn viewer() -> User {
        User {
            id: UserId::new("u-2"),
            name: "Viewer".to_string(),
            email: Email::parse("viewer@miraki.com").unwrap(),
            role: Role::Viewer,
            permissions: None,
            profile_image: None,
            created_at: None,
            last_login: None,
        }
    }

    fn manager() -> (SessionManager, CredentialStore) {
        let store = CredentialStore::in_memory();
        let transport = HttpTransport::new(&ConsoleConfig::default(), store.clone()).unwrap();
        (
            SessionManager::new(AuthService::new(transport), Notifier::new()),
            store,
        )
    }

    #[test]
    fn test_unauthenticated_session_has_no_permissions() {
        let session = Session::unauthenticated();
        assert!(!session.is_loading());
        assert!(!session.has_permission("manage_artworks"));
    }

    #[test]
    fn test_initializing_is_loading() {
        assert!(Session::initializing().is_loading());
    }

    #[tokio::test]
    async fn test_initialize_without_token_is_unauthenticated() {
        let (manager, _store) = manager();
        manager.initialize().await;
        let session = manager.ready().await;
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session.user().is_none());
    }

    #[test]
    fn test_session_reconciles_with_cleared_store() {
        let (manager, store) = manager();
        store
            .save(&SecretString::from("t-1".to_string()), &viewer())
            .unwrap();
        manager.state.send_replace(Session::authenticated(viewer()));
        assert!(manager.session().is_authenticated());

        store.clear();

        let session = manager.session();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }
}
