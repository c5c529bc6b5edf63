//! Sign-in, sign-out, and identity commands.

use miraki_console::Console;
use miraki_core::Permission;
use secrecy::SecretString;

use super::{CliError, require_session};

/// Sign in and persist the session.
pub async fn login(console: &Console, email: &str, password: String) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let user = console.login(email, &password).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Signed in as {} ({})", user.name, user.role);
    }
    Ok(())
}

/// Sign out. Always succeeds locally.
pub async fn logout(console: &Console) {
    console.logout().await;

    #[allow(clippy::print_stdout)]
    {
        println!("Signed out");
    }
}

/// Print the signed-in user.
pub async fn whoami(console: &Console) -> Result<(), CliError> {
    require_session(console)?;
    let session = console.session_manager().ready().await;
    let user = session.user().ok_or(CliError::NotSignedIn)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} <{}>", user.name, user.email);
        println!("Role: {}", user.role);
        let granted: Vec<String> = Permission::ALL
            .iter()
            .filter(|p| user.role.allows(p.as_ref()))
            .map(ToString::to_string)
            .collect();
        println!("Permissions: {}", granted.join(", "));
    }
    Ok(())
}

/// Print whether the signed-in user holds `permission`.
pub async fn can(console: &Console, permission: &str) {
    if !Permission::ALL.iter().any(|p| p.as_ref() == permission) {
        tracing::warn!(permission, "Unknown permission name");
    }
    let allowed = console.session_manager().ready().await.has_permission(permission);

    #[allow(clippy::print_stdout)]
    {
        println!("{}", if allowed { "yes" } else { "no" });
    }
}
