//! HTTP transport for the marketplace REST API.
//!
//! A single configured `reqwest` client shared by every service. It attaches
//! the stored bearer token, unwraps the response envelope, and maps HTTP
//! failures onto [`ApiError`]. A 401 on a request that carried a token clears
//! the credential store; the session manager observes the clear.

use std::borrow::Cow;
use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ConsoleConfig;
use crate::error::ApiError;
use crate::storage::CredentialStore;

/// Multipart field the upload endpoints read the file from.
pub const UPLOAD_FIELD: &str = "image";

/// Response envelope used by every endpoint.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

impl Envelope {
    fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    fn error_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .or_else(|| self.message.clone())
            .unwrap_or_default()
    }

    fn error_details(&mut self) -> Option<Value> {
        self.error.as_mut().and_then(|e| e.details.take())
    }
}

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

/// Shared HTTP client for the REST API.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

struct HttpTransportInner {
    client: reqwest::Client,
    base_url: String,
    credentials: CredentialStore,
}

impl HttpTransport {
    /// Build the transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be constructed.
    pub fn new(config: &ConsoleConfig, credentials: CredentialStore) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpTransportInner {
                client,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
                credentials,
            }),
        })
    }

    /// The credential store this transport reads tokens from.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    /// Absolute URL for an API path such as `/artworks`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner.client.request(method, self.url(path))
    }

    // =========================================================================
    // Verbs
    // =========================================================================

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path), Auth::Bearer)
            .await
    }

    /// `GET path?query`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn get_with<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path).query(query), Auth::Bearer)
            .await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body), Auth::Bearer)
            .await
    }

    /// `POST path` with no body.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path), Auth::Bearer)
            .await
    }

    /// `POST path` without the bearer token. Used for login, so a rejected
    /// attempt never touches the stored session.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn post_anonymous<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body), Auth::Anonymous)
            .await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path).json(body), Auth::Bearer)
            .await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PATCH, path).json(body), Auth::Bearer)
            .await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.request(Method::DELETE, path), Auth::Bearer)
            .await
    }

    /// `POST path` with a multipart form.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`ApiError`] for transport or HTTP failures.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, path).multipart(form), Auth::Bearer)
            .await
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let token = match auth {
            Auth::Bearer => self.inner.credentials.token(),
            Auth::Anonymous => None,
        };
        let builder = match &token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };
        let request = builder.build()?;
        self.execute(request, token).await
    }

    #[instrument(
        skip_all,
        fields(method = %request.method(), path = %request.url().path(), authenticated = token.is_some())
    )]
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
        token: Option<SecretString>,
    ) -> Result<T, ApiError> {
        let response = self.inner.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Response received");

        if status == StatusCode::UNAUTHORIZED
            && let Some(token) = &token
            && self.inner.credentials.clear_if_current(token)
        {
            warn!("Request rejected with 401, cleared stored credentials");
        }

        decode_response(status, &body)
    }
}

/// Unwrap the envelope of a response, or map it to an error.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    if !status.is_success() {
        let envelope = Envelope::parse(body).unwrap_or_default();
        return Err(map_error(status, envelope));
    }

    let mut envelope = Envelope::parse(body)?;
    if envelope.success == Some(false) {
        return Err(ApiError::Validation {
            message: envelope.error_message(),
            details: envelope.error_details(),
        });
    }

    let data = envelope.data.take().unwrap_or(Value::Null);
    Ok(serde_json::from_value(data)?)
}

/// Map a non-2xx status onto the error taxonomy.
fn map_error(status: StatusCode, mut envelope: Envelope) -> ApiError {
    let message = envelope.error_message();
    if let Some(code) = envelope.error.as_ref().and_then(|e| e.code.as_deref()) {
        debug!(status = status.as_u16(), code, "API error");
    }

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        s if s.is_client_error() => ApiError::Validation {
            message,
            details: envelope.error_details(),
        },
        s => ApiError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

/// Percent-encode a value used as a single path segment.
#[must_use]
pub fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Build the single-file form the upload endpoints expect.
#[must_use]
pub fn image_form(bytes: Vec<u8>, file_name: &str) -> Form {
    Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(file_name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_success_unwraps_data() {
        let raw = body(&json!({"success": true, "data": {"name": "Ravi"}}));
        let value: Value = decode_response(StatusCode::OK, &raw).unwrap();
        assert_eq!(value, json!({"name": "Ravi"}));
    }

    #[test]
    fn test_missing_data_decodes_as_unit() {
        let raw = body(&json!({"success": true, "message": "Deleted"}));
        decode_response::<()>(StatusCode::OK, &raw).unwrap();
        decode_response::<()>(StatusCode::NO_CONTENT, b"").unwrap();
    }

    #[test]
    fn test_success_false_is_validation() {
        let raw = body(&json!({
            "success": false,
            "error": {"code": "BAD_INPUT", "message": "Title is required", "details": {"field": "title"}}
        }));
        let err = decode_response::<Value>(StatusCode::OK, &raw).unwrap_err();
        match err {
            ApiError::Validation { message, details } => {
                assert_eq!(message, "Title is required");
                assert_eq!(details, Some(json!({"field": "title"})));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_mapping() {
        let raw = body(&json!({"success": false, "message": "nope"}));

        assert!(matches!(
            decode_response::<Value>(StatusCode::UNAUTHORIZED, &raw),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            decode_response::<Value>(StatusCode::FORBIDDEN, &raw),
            Err(ApiError::Forbidden(m)) if m == "nope"
        ));
        assert!(matches!(
            decode_response::<Value>(StatusCode::NOT_FOUND, &raw),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            decode_response::<Value>(StatusCode::UNPROCESSABLE_ENTITY, &raw),
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            decode_response::<Value>(StatusCode::BAD_GATEWAY, &raw),
            Err(ApiError::Server { status: 502, .. })
        ));
    }

    #[test]
    fn test_non_json_error_body_has_empty_message() {
        let err = decode_response::<Value>(StatusCode::INTERNAL_SERVER_ERROR, b"<html>").unwrap_err();
        assert_eq!(err.user_message(), crate::error::GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_malformed_success_body_is_decode_error() {
        let err = decode_response::<Value>(StatusCode::OK, b"{oops").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment("Digital Art"), "Digital%20Art");
        assert_eq!(segment("a/b"), "a%2Fb");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ConsoleConfig {
            api_base_url: url::Url::parse("http://localhost:3000/api/v1/").unwrap(),
            ..ConsoleConfig::default()
        };
        let transport = HttpTransport::new(&config, CredentialStore::in_memory()).unwrap();
        assert_eq!(transport.url("/artworks"), "http://localhost:3000/api/v1/artworks");
    }
}
