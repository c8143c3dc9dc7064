//! Web API connector
//!
//! [`SpotifyHttp`] sends one [`Route`] through the host's [`HttpClient`],
//! retries transient failures and classifies the rest. The endpoint wrappers
//! live in `endpoints.rs`.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::AccessTokenProvider;
use core_runtime::CatalogConfig;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{ApiErrorDetails, Result, SpotifyError};
use crate::retry::RetryPolicy;
use crate::route::Route;

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Raw {
        content_type: &'static str,
        data: Bytes,
    },
}

/// Authenticated Web API transport.
///
/// # Features
///
/// - Bearer token fetched from the [`AccessTokenProvider`] on every attempt
/// - Linear backoff on 500/502/504/524 and on connection resets
/// - 403/404/5xx/other classification with the API's error code and message
///
/// # Example
///
/// ```ignore
/// use provider_spotify::{Route, SpotifyHttp};
///
/// let http = SpotifyHttp::new(http_client, token_provider);
/// let me = http.request(&Route::get("/me"), None).await?;
/// ```
pub struct SpotifyHttp {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn AccessTokenProvider>,
    api_base_url: String,
    user_agent: String,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl SpotifyHttp {
    pub fn new(http_client: Arc<dyn HttpClient>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http_client,
            tokens,
            api_base_url: core_runtime::config::DEFAULT_API_BASE_URL.to_string(),
            user_agent: format!("catalog-client/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: core_runtime::config::DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Connector using the base URL, timeout, user agent and HTTP client of
    /// the configuration.
    pub fn from_config(config: &CatalogConfig, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout,
            ..Self::new(config.http_client.clone(), tokens)
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Token provider shared with the rest of the session.
    pub fn token_provider(&self) -> &Arc<dyn AccessTokenProvider> {
        &self.tokens
    }

    fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        token: &str,
        body: Option<&RequestBody>,
    ) -> Result<HttpRequest> {
        let request = HttpRequest::new(method, url)
            .bearer_token(token)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json")
            .timeout(self.request_timeout);

        Ok(match body {
            None => request,
            Some(RequestBody::Json(value)) => request.json(value)?,
            Some(RequestBody::Raw { content_type, data }) => request
                .header("Content-Type", *content_type)
                .body(data.clone()),
        })
    }

    fn parse_body(response: &HttpResponse) -> Result<Option<Value>> {
        if response.has_empty_body() {
            return Ok(None);
        }
        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| SpotifyError::Parse(format!("Invalid JSON body: {}", e)))
    }

    /// Send a request, returning the parsed JSON body or `None` when the
    /// response has no body.
    ///
    /// Retryable statuses are retried up to the policy's attempt limit, the
    /// last one surfacing as [`SpotifyError::ServerError`]. Connection resets
    /// are retried up to `max_connection_retries` times.
    #[instrument(skip(self, route, body), fields(method = %route.method(), path = %route.path()))]
    pub async fn request(&self, route: &Route, body: Option<RequestBody>) -> Result<Option<Value>> {
        let url = route.url(&self.api_base_url)?;
        let mut attempt: u32 = 0;

        loop {
            let token = self.tokens.access_token().await?;
            let request = self.build_request(route.method(), &url, &token, body.as_ref())?;

            match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, attempt, "API request succeeded");
                    return Self::parse_body(&response);
                }
                Ok(response) => {
                    let status = response.status;
                    if self.retry.is_retryable_status(status) && self.retry.may_retry_status(attempt) {
                        let delay = self.retry.delay_for(attempt);
                        warn!(
                            status,
                            attempt = attempt + 1,
                            max_attempts = self.retry.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Transient API failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let details = ApiErrorDetails::from_body(status, &response.body);
                    warn!(status, code = details.code, message = %details.message, "API request failed");
                    return Err(SpotifyError::from_status(details));
                }
                Err(e) if e.is_connection_reset() && self.retry.may_retry_reset(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Connection reset, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_connection_reset() => {
                    warn!(attempts = attempt + 1, "Connection reset, giving up");
                    return Err(SpotifyError::Bridge(e));
                }
                Err(e) => {
                    warn!(error = %e, "API request failed without response");
                    return Err(SpotifyError::Network(e.to_string()));
                }
            }
        }
    }

    /// [`request`](Self::request) for endpoints that always return a body.
    pub async fn request_json(&self, route: &Route, body: Option<RequestBody>) -> Result<Value> {
        self.request(route, body)
            .await?
            .ok_or_else(|| SpotifyError::Parse(format!("Empty response body for {}", route.path())))
    }
}

impl std::fmt::Debug for SpotifyHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyHttp")
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use core_auth::StaticTokenProvider;
    use mockall::mock;
    use mockall::Sequence;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn connector(mock: MockHttpClient) -> SpotifyHttp {
        SpotifyHttp::new(Arc::new(mock), Arc::new(StaticTokenProvider::new("test_token")))
            .with_retry_policy(RetryPolicy::no_delay())
    }

    #[tokio::test]
    async fn test_request_sends_auth_headers() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(req.url, "https://api.spotify.com/v1/me");
            assert_eq!(req.headers.get("Authorization").map(String::as_str), Some("Bearer test_token"));
            assert_eq!(req.headers.get("Accept").map(String::as_str), Some("application/json"));
            assert!(req.headers.contains_key("User-Agent"));
            Ok(HttpResponse::new(200, r#"{"id": "me", "type": "user"}"#))
        });

        let value = connector(mock_http).request(&Route::get("/me"), None).await.unwrap();
        assert_eq!(value.unwrap()["id"], "me");
    }

    #[tokio::test]
    async fn test_empty_body_is_none() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(204, "")));

        let value = connector(mock_http)
            .request(&Route::put("/me/albums").query("ids", "a"), None)
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_json_body_is_sent() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.headers.get("Content-Type").map(String::as_str), Some("application/json"));
            let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(sent["name"], "Mix");
            Ok(HttpResponse::new(201, r#"{"id": "p"}"#))
        });

        let body = RequestBody::Json(serde_json::json!({"name": "Mix"}));
        connector(mock_http)
            .request_json(&Route::post("/users/u/playlists"), Some(body))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_retryable_status_then_success() {
        let mut seq = Sequence::new();
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(502, "Bad Gateway")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"ok": true}"#)));

        let value = connector(mock_http).request_json(&Route::get("/me"), None).await.unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_retryable_status_exhausts_attempts() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(5)
            .returning(|_| Ok(HttpResponse::new(504, "")));

        let err = connector(mock_http).request(&Route::get("/me"), None).await.unwrap_err();
        assert!(matches!(err, SpotifyError::ServerError(ref d) if d.status == 504));
    }

    #[tokio::test]
    async fn test_non_retryable_server_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(503, r#"{"error": {"status": 503, "message": "Service unavailable"}}"#)));

        let err = connector(mock_http).request(&Route::get("/me"), None).await.unwrap_err();
        match err {
            SpotifyError::ServerError(details) => {
                assert_eq!(details.code, 503);
                assert_eq!(details.message, "Service unavailable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_classified() {
        for (status, expect_forbidden, expect_not_found) in [(403, true, false), (404, false, true)] {
            let mut mock_http = MockHttpClient::new();
            mock_http.expect_execute().times(1).returning(move |_| {
                Ok(HttpResponse::new(status, r#"{"error": {"status": 0, "message": "nope"}}"#))
            });

            let err = connector(mock_http).request(&Route::get("/me"), None).await.unwrap_err();
            assert_eq!(matches!(err, SpotifyError::Forbidden(_)), expect_forbidden);
            assert_eq!(matches!(err, SpotifyError::NotFound(_)), expect_not_found);
        }

        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(400, r#"{"error": {"status": 400, "message": "invalid id"}}"#))
        });
        let err = connector(mock_http).request(&Route::get("/albums/!"), None).await.unwrap_err();
        assert!(matches!(err, SpotifyError::Http(ref d) if d.code == 400 && d.message == "invalid id"));
    }

    #[tokio::test]
    async fn test_connection_reset_is_retried() {
        let mut seq = Sequence::new();
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::ConnectionReset("peer".into())));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"id": "x"}"#)));

        let value = connector(mock_http).request_json(&Route::get("/tracks/x"), None).await.unwrap();
        assert_eq!(value["id"], "x");
    }

    #[tokio::test]
    async fn test_connection_reset_gives_up_after_four_retries() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(5)
            .returning(|_| Err(BridgeError::ConnectionReset("peer".into())));

        let err = connector(mock_http).request(&Route::get("/me"), None).await.unwrap_err();
        assert!(matches!(err, SpotifyError::Bridge(BridgeError::ConnectionReset(_))));
    }

    #[tokio::test]
    async fn test_other_transport_failures_are_not_retried() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::Timeout("30s".into())));

        let err = connector(mock_http).request(&Route::get("/me"), None).await.unwrap_err();
        assert!(matches!(err, SpotifyError::Network(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<html>")));

        let err = connector(mock_http).request(&Route::get("/me"), None).await.unwrap_err();
        assert!(matches!(err, SpotifyError::Parse(_)));
    }
}
