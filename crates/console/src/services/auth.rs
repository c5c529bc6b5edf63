//! Authentication against `/auth`.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::json;
use tracing::{info, instrument, warn};

use miraki_core::Email;

use crate::error::ApiError;
use crate::models::User;
use crate::storage::CredentialStore;
use crate::transport::HttpTransport;

const REJECTED_LOGIN_MESSAGE: &str = "Invalid email or password";

#[derive(Deserialize)]
struct LoginResponse {
    user: User,
    token: String,
}

/// Login, logout, and token validation. Owns the credential store through the
/// transport it shares with the resource services.
#[derive(Clone)]
pub struct AuthService {
    transport: HttpTransport,
}

impl AuthService {
    #[must_use]
    pub const fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub(crate) fn credentials(&self) -> &CredentialStore {
        self.transport.credentials()
    }

    /// Exchange an email and password for a session and persist it.
    ///
    /// The request is sent without the stored token, so a rejected attempt
    /// leaves any existing session untouched.
    ///
    /// # Errors
    ///
    /// - `ApiError::Validation` if the email is malformed
    /// - `ApiError::InvalidCredentials` if the server rejects the pair
    /// - `ApiError::Storage` if the session cannot be persisted
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::Validation {
            message: e.to_string(),
            details: None,
        })?;

        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });
        let response: LoginResponse = self
            .transport
            .post_anonymous("/auth/login", &body)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => {
                    ApiError::InvalidCredentials(REJECTED_LOGIN_MESSAGE.to_string())
                }
                ApiError::Forbidden(message) | ApiError::Validation { message, .. } => {
                    ApiError::InvalidCredentials(if message.is_empty() {
                        REJECTED_LOGIN_MESSAGE.to_string()
                    } else {
                        message
                    })
                }
                other => other,
            })?;

        let token = SecretString::from(response.token);
        self.credentials().save(&token, &response.user)?;
        info!(user_id = %response.user.id, role = %response.user.role, "Logged in");
        Ok(response.user)
    }

    /// Notify the server, then clear the stored session whatever the outcome.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self
            .transport
            .post_empty::<IgnoredAny>("/auth/logout")
            .await
        {
            warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.credentials().clear();
        info!("Logged out");
    }

    /// Ask the server whether the stored token is still valid. Any failure
    /// counts as invalid.
    #[instrument(skip(self))]
    pub async fn validate_token(&self) -> bool {
        match self.transport.get::<IgnoredAny>("/auth/validate").await {
            Ok(_) => true,
            Err(e) => {
                info!(error = %e, "Token validation failed");
                false
            }
        }
    }

    /// The last-known user, read from the store without a network call.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.credentials().read().map(|creds| creds.user)
    }

    /// Whether a token is stored. Says nothing about server-side validity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials().has_token()
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the server rejects the change.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), ApiError> {
        let body = json!({
            "currentPassword": current.expose_secret(),
            "newPassword": new.expose_secret(),
            "confirmPassword": new.expose_secret(),
        });
        self.transport
            .post::<IgnoredAny, _>("/auth/change-password", &body)
            .await?;
        info!("Password changed");
        Ok(())
    }
}
