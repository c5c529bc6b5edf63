//! Miraki Console - data-access and authorization layer for the marketplace
//! admin console.
//!
//! This crate is what a console front end talks to:
//! - An authenticated HTTP transport that unwraps the backend envelope
//! - Typed services for artists, artworks, orders, banners, and collections
//! - A session manager that restores, validates, and clears credentials
//! - A keyed query cache with request sharing, retry, and invalidation
//!
//! # Example
//!
//! ```no_run
//! use miraki_console::{Console, ConsoleConfig};
//! use miraki_console::models::ArtworkQuery;
//! use secrecy::SecretString;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConsoleConfig::from_env()?;
//! let console = Console::with_file_store(&config)?;
//! let _restore = console.start();
//!
//! let password = SecretString::from("hunter2".to_string());
//! console.login("admin@miraki-art.com", &password).await?;
//!
//! let page = console.artworks(&ArtworkQuery::default()).fetch().await?;
//! println!("{} artworks", page.pagination.total);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod notify;
pub mod permissions;
pub mod query;
pub mod services;
pub mod session;
pub mod storage;
pub mod transport;

pub use config::{ConfigError, ConsoleConfig, QueryConfig};
pub use console::Console;
pub use error::ApiError;
pub use notify::{Notification, NotificationKind, Notifier};
pub use permissions::has_permission;
pub use query::{Mutation, Query, QueryCache, QueryKey, QueryState, QueryStatus, QuerySubscription};
pub use session::{AuthState, Session, SessionManager};
pub use storage::{CredentialStore, FileStore, MemoryStore};
pub use transport::HttpTransport;
