//! The console facade: one handle wiring transport, services, session, and
//! cache together.
//!
//! Reads return a [`Query`] that can be fetched once or watched; writes run
//! through [`QueryCache::mutate`] so the affected keys are invalidated and
//! the outcome is notified.

mod artists;
mod artworks;
mod banners;
mod collections;
mod orders;

pub use banners::move_item;

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::ConsoleConfig;
use crate::error::ApiError;
use crate::models::User;
use crate::notify::Notifier;
use crate::query::{Query, QueryCache, QueryKey};
use crate::services::Services;
use crate::session::{Session, SessionManager};
use crate::storage::{CredentialStore, FileStore};
use crate::transport::HttpTransport;

/// Entry point for console consumers.
#[derive(Clone)]
pub struct Console {
    services: Services,
    cache: QueryCache,
    session: Arc<SessionManager>,
    notifier: Notifier,
}

impl Console {
    /// Build a console over an explicit credential store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig, credentials: CredentialStore) -> Result<Self, ApiError> {
        let notifier = Notifier::new();
        let transport = HttpTransport::new(config, credentials)?;
        let services = Services::new(&transport);
        let cache = QueryCache::new(config.query.clone(), notifier.clone());
        let session = Arc::new(SessionManager::new(
            services.auth.clone(),
            notifier.clone(),
        ));

        Ok(Self {
            services,
            cache,
            session,
            notifier,
        })
    }

    /// Build a console persisting credentials at `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn with_file_store(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let store = CredentialStore::new(FileStore::new(config.storage_path.clone()));
        Self::new(config, store)
    }

    /// Restore the stored session and keep it in sync with the store.
    pub fn start(&self) -> JoinHandle<()> {
        self.session.start()
    }

    #[must_use]
    pub const fn services(&self) -> &Services {
        &self.services
    }

    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    #[must_use]
    pub const fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session
    }

    #[must_use]
    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Current session, reconciled against the credential store.
    #[must_use]
    pub fn session(&self) -> Session {
        self.session.session()
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.session.has_permission(permission)
    }

    /// Sign in. Cached data from any previous user is dropped first.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::login`].
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, ApiError> {
        self.cache.clear();
        self.session.login(email, password).await
    }

    /// Sign out and drop all cached data.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.cache.clear();
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection after notifying it.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), ApiError> {
        match self.services.auth.change_password(current, new).await {
            Ok(()) => {
                self.notifier
                    .success("Password changed", "Your password has been updated.");
                Ok(())
            }
            Err(e) => {
                self.notifier.error("Error", e.user_message());
                Err(e)
            }
        }
    }

    /// Describe a cached read served by a clone of `service`.
    fn read<S, T, F, Fut>(&self, key: QueryKey, service: S, fetch: F) -> Query<T>
    where
        S: Clone + Send + Sync + 'static,
        T: serde::Serialize + serde::de::DeserializeOwned + Send + 'static,
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.cache.query(key, move || fetch(service.clone()))
    }
}
