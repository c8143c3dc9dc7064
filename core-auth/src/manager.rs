//! # Token Manager
//!
//! Owns the cached token set of one client and hands out valid access
//! tokens on demand.
//!
//! ## Overview
//!
//! - A fresh cached token is returned as is.
//! - An expired token with a refresh token is refreshed.
//! - Without any usable token the interactive authorization flow runs
//!   through an [`AuthorizationPrompt`].
//!
//! The cache sits behind a `tokio::sync::Mutex`, so concurrent callers
//! observing an expired token trigger a single refresh; the others wait and
//! reuse its result.

use crate::error::{AuthError, Result};
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::types::OAuthTokens;
use async_trait::async_trait;
use core_runtime::logging::fingerprint;
use core_runtime::CatalogConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use std::sync::Arc;

/// Source of bearer tokens for API requests.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// Shows the authorization URL to the user and returns the callback URL
/// they were redirected to.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn authorize(&self, authorize_url: &str) -> Result<String>;
}

/// Terminal prompt: prints the URL and reads the callback URL from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

#[async_trait]
impl AuthorizationPrompt for StdinPrompt {
    async fn authorize(&self, authorize_url: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        let banner = format!("{}\nCallback: ", authorize_url);
        let write_error = |e: std::io::Error| AuthError::Other(format!("Failed to write prompt: {}", e));
        stdout.write_all(banner.as_bytes()).await.map_err(write_error)?;
        stdout.flush().await.map_err(write_error)?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| AuthError::Other(format!("Failed to read callback URL: {}", e)))?;

        let callback = line.trim().to_string();
        if callback.is_empty() {
            return Err(AuthError::AuthenticationFailed {
                reason: "No callback URL entered".to_string(),
            });
        }
        Ok(callback)
    }
}

/// Fixed token, for hosts that obtain tokens elsewhere.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Token cache with refresh and interactive fallback.
pub struct TokenManager {
    flow: OAuthFlowManager,
    prompt: Arc<dyn AuthorizationPrompt>,
    tokens: Mutex<Option<OAuthTokens>>,
}

impl TokenManager {
    pub fn new(flow: OAuthFlowManager, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        Self {
            flow,
            prompt,
            tokens: Mutex::new(None),
        }
    }

    /// Build from the catalog configuration, seeding the cache with the
    /// configured refresh token if any.
    pub fn from_config(config: &CatalogConfig, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        let flow = OAuthFlowManager::new(
            OAuthConfig::from_catalog_config(config),
            config.http_client.clone(),
        );
        let manager = Self::new(flow, prompt);
        match &config.refresh_token {
            Some(refresh_token) => manager.with_tokens(OAuthTokens::from_refresh_token(refresh_token)),
            None => manager,
        }
    }

    /// Seed the cache.
    pub fn with_tokens(self, tokens: OAuthTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
            ..self
        }
    }

    pub fn flow(&self) -> &OAuthFlowManager {
        &self.flow
    }

    /// Snapshot of the cached token set.
    pub async fn tokens(&self) -> Option<OAuthTokens> {
        self.tokens.lock().await.clone()
    }

    pub async fn set_tokens(&self, tokens: OAuthTokens) {
        *self.tokens.lock().await = Some(tokens);
    }

    /// Drop the cached tokens; the next request re-authorizes.
    pub async fn clear(&self) {
        self.tokens.lock().await.take();
    }

    /// Run the interactive authorization flow.
    #[instrument(skip(self))]
    async fn authorize_interactively(&self) -> Result<OAuthTokens> {
        let (url, verifier) = self.flow.build_auth_url()?;
        info!("User authorization required");
        let callback = self.prompt.authorize(&url).await?;
        self.flow.complete_authorization(&callback, &verifier).await
    }
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.tokens.lock().await;

        let fresh = match cached.as_ref() {
            Some(tokens) if !tokens.is_expired() => {
                return Ok(tokens.access_token.clone());
            }
            Some(tokens) => match tokens.refresh_token.as_deref().filter(|t| !t.is_empty()) {
                Some(refresh_token) => {
                    debug!("Access token expired, refreshing");
                    self.flow.refresh_access_token(refresh_token).await?
                }
                None => self.authorize_interactively().await?,
            },
            None => self.authorize_interactively().await?,
        };

        if fresh.access_token.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }

        debug!(access_token = %fingerprint(&fresh.access_token), "Token cache updated");
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    mock! {
        Prompt {}

        #[async_trait]
        impl AuthorizationPrompt for Prompt {
            async fn authorize(&self, authorize_url: &str) -> Result<String>;
        }
    }

    /// Answers every token request with a new access token and counts calls.
    struct CountingTokenEndpoint {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingTokenEndpoint {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl HttpClient for CountingTokenEndpoint {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            if !request.url.ends_with("/api/token") {
                return Err(BridgeError::OperationFailed(format!(
                    "unexpected url {}",
                    request.url
                )));
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            Ok(HttpResponse::new(
                200,
                format!(r#"{{"access_token":"BQD{}","expires_in":3600}}"#, n),
            ))
        }
    }

    fn config(http: Arc<dyn HttpClient>, refresh_token: Option<&str>) -> CatalogConfig {
        let mut builder = CatalogConfig::builder()
            .client_id("cid")
            .client_secret("secret")
            .redirect_uri("http://localhost:8888/callback")
            .accounts_base_url("https://accounts.example.com")
            .http_client(http);
        if let Some(token) = refresh_token {
            builder = builder.refresh_token(token);
        }
        builder.build().unwrap()
    }

    fn unused_prompt() -> Arc<dyn AuthorizationPrompt> {
        let mut prompt = MockPrompt::new();
        prompt.expect_authorize().never();
        Arc::new(prompt)
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("BQDstatic");
        assert_eq!(provider.access_token().await.unwrap(), "BQDstatic");
        assert!(!format!("{:?}", provider).contains("BQDstatic"));
    }

    #[tokio::test]
    async fn test_fresh_token_is_returned_without_requests() {
        let http = CountingTokenEndpoint::new(Duration::ZERO);
        let manager = TokenManager::from_config(&config(http.clone(), None), unused_prompt())
            .with_tokens(OAuthTokens::new("BQDcached".to_string(), None, 3600));

        assert_eq!(manager.access_token().await.unwrap(), "BQDcached");
        assert_eq!(http.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_seeded_refresh_token_refreshes_once() {
        let http = CountingTokenEndpoint::new(Duration::ZERO);
        let manager =
            TokenManager::from_config(&config(http.clone(), Some("AQDseed")), unused_prompt());

        assert_eq!(manager.access_token().await.unwrap(), "BQD1");
        assert_eq!(manager.access_token().await.unwrap(), "BQD1");
        assert_eq!(http.calls.load(Ordering::SeqCst), 1);

        let tokens = manager.tokens().await.unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("AQDseed"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_refresh() {
        let http = CountingTokenEndpoint::new(Duration::from_millis(20));
        let manager = Arc::new(TokenManager::from_config(
            &config(http.clone(), Some("AQDseed")),
            unused_prompt(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.access_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "BQD1");
        }
        assert_eq!(http.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_token_runs_interactive_flow() {
        let http = CountingTokenEndpoint::new(Duration::ZERO);

        let mut prompt = MockPrompt::new();
        prompt
            .expect_authorize()
            .withf(|url: &str| url.starts_with("https://accounts.example.com/authorize?"))
            .times(1)
            .returning(|url| {
                let state = url::Url::parse(url)
                    .unwrap()
                    .query_pairs()
                    .find(|(k, _)| k == "state")
                    .map(|(_, v)| v.into_owned())
                    .unwrap();
                Ok(format!(
                    "http://localhost:8888/callback?code=AQBcode&state={}",
                    state
                ))
            });

        let manager = TokenManager::from_config(&config(http.clone(), None), Arc::new(prompt));

        assert_eq!(manager.access_token().await.unwrap(), "BQD1");
        assert_eq!(http.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prompt_failure_propagates() {
        let http = CountingTokenEndpoint::new(Duration::ZERO);

        let mut prompt = MockPrompt::new();
        prompt
            .expect_authorize()
            .times(1)
            .returning(|_| Err(AuthError::AuthorizationDenied("access_denied".to_string())));

        let manager = TokenManager::from_config(&config(http.clone(), None), Arc::new(prompt));

        assert!(matches!(
            manager.access_token().await,
            Err(AuthError::AuthorizationDenied(_))
        ));
        assert_eq!(http.calls.load(Ordering::SeqCst), 0);
        assert!(manager.tokens().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_forgets_tokens() {
        let http = CountingTokenEndpoint::new(Duration::ZERO);
        let manager = TokenManager::from_config(&config(http, None), unused_prompt());

        manager
            .set_tokens(OAuthTokens::new("BQDx".to_string(), None, 3600))
            .await;
        assert!(manager.tokens().await.is_some());

        manager.clear().await;
        assert!(manager.tokens().await.is_none());
    }
}
