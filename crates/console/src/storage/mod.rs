//! Persistent key/value storage for session state.
//!
//! The console persists exactly two entries (`token` and `user`). Backends
//! implement [`KeyValueStore`]; [`FileStore`] survives restarts and
//! [`MemoryStore`] is used in tests and ephemeral sessions.

mod credentials;
mod file;
mod memory;

pub use credentials::{CredentialStore, Credentials};
pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt storage data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Synchronous string key/value storage.
///
/// Operations are small local reads and writes, so the trait is not async.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
