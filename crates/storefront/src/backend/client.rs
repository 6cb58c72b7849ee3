//! HTTP plumbing shared by the auth and table calls.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use url::Url;

use crate::config::BackendConfig;

use super::cache::{CacheKey, CacheValue};
use super::{AuthEvent, BackendError, NO_ROWS_CODE};

/// Media type that makes PostgREST return a single object instead of an array.
pub(super) const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Capacity of the auth event channel; slow subscribers skip old events.
const AUTH_EVENT_CAPACITY: usize = 64;

/// Client for the hosted auth/database service.
///
/// Cheap to clone. Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
    events: broadcast::Sender<AuthEvent>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        // `Url::join` replaces the last path segment unless the base ends in '/'
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url,
                anon_key: config.anon_key.clone(),
                cache,
                events,
            }),
        }
    }

    /// Subscribe to auth state changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    pub(super) fn publish(&self, event: AuthEvent) {
        // Sending only fails when nobody is listening
        let _ = self.inner.events.send(event);
    }

    pub(super) fn auth_url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(&format!("auth/v1/{path}"))?)
    }

    pub(super) fn rest_url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base_url.join(&format!("rest/v1/{path}"))?)
    }

    /// Start a request carrying the API key and a bearer token.
    ///
    /// Without a user access token the anon key doubles as the bearer token.
    pub(super) fn request(
        &self,
        method: Method,
        url: Url,
        access_token: Option<&str>,
    ) -> RequestBuilder {
        let anon_key = self.inner.anon_key.expose_secret();
        let bearer = access_token.unwrap_or(anon_key);
        self.inner
            .client
            .request(method, url)
            .header("apikey", anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request and deserialize the JSON body.
    pub(super) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    pub(super) async fn execute_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let err = parse_error_body(status, &body);
            if err.is_not_found() {
                tracing::debug!(status = %status, "Backend returned no rows");
            } else {
                tracing::warn!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Backend returned non-success status"
                );
            }
            return Err(err);
        }

        Ok(body)
    }

    pub(super) async fn cache_get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(key).await
    }

    pub(super) async fn cache_insert(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop cached products and categories.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}

/// Error payload shapes of the auth and table APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn a non-success response into a [`BackendError`].
fn parse_error_body(status: StatusCode, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = match parsed.code {
        Some(serde_json::Value::String(code)) => Some(code),
        _ => parsed.error_code,
    };

    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown backend error")
                .to_string()
        });

    if code.as_deref() == Some(NO_ROWS_CODE) {
        return BackendError::NotFound(message);
    }

    BackendError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,
            "message":"JSON object requested, multiple (or no) rows returned"}"#;
        let err = parse_error_body(StatusCode::NOT_ACCEPTABLE, body);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_auth_error_description_is_surfaced() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let err = parse_error_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.api_message(), Some("Invalid login credentials"));
    }

    #[test]
    fn test_msg_field_and_numeric_code() {
        let body = r#"{"code":422,"msg":"User already registered"}"#;
        match parse_error_body(StatusCode::UNPROCESSABLE_ENTITY, body) {
            BackendError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 422);
                assert_eq!(code, None);
                assert_eq!(message, "User already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_body_falls_back_to_reason() {
        let err = parse_error_body(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.api_message(), Some("Bad Gateway"));
    }

    #[test]
    fn test_urls_keep_base_path() {
        let config = BackendConfig {
            url: Url::parse("https://backend.example.org/project").unwrap(),
            anon_key: SecretString::from("k"),
        };
        let client = BackendClient::new(&config);
        assert_eq!(
            client.rest_url("products").unwrap().as_str(),
            "https://backend.example.org/project/rest/v1/products"
        );
        assert_eq!(
            client.auth_url("token").unwrap().as_str(),
            "https://backend.example.org/project/auth/v1/token"
        );
    }
}
