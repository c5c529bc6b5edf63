//! Command implementations. Each command prints its result to stdout and
//! leaves diagnostics to tracing.

pub mod banners;
pub mod catalog;
pub mod orders;
pub mod session;

use miraki_console::{ApiError, ConfigError, Console, ConsoleConfig};
use thiserror::Error;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration could not be parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend or the local store rejected the operation.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `miraki login` first.")]
    NotSignedIn,
}

/// Build a console from the environment and restore the stored session.
pub async fn open() -> Result<Console, CliError> {
    let config = ConsoleConfig::from_env()?;
    tracing::debug!(api = %config.api_base_url, "Opening console");

    let console = Console::with_file_store(&config)?;
    console.session_manager().initialize().await;
    Ok(console)
}

/// Fail with [`CliError::NotSignedIn`] unless a session is active.
pub fn require_session(console: &Console) -> Result<(), CliError> {
    if console.session().is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}
