//! OAuth 2.0 Authorization Code Flow with PKCE
//!
//! Implements RFC 6749 (authorization code grant) and RFC 7636 (PKCE)
//! against the accounts service.
//!
//! # Overview
//!
//! - Building authorization URLs with a `state` value and S256 challenge
//! - Parsing the callback URL the user is redirected to
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//!
//! Confidential clients authenticate to the token endpoint with HTTP Basic
//! credentials; public clients send `client_id` in the form body and rely on
//! the PKCE verifier.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use core_runtime::CatalogConfig;
//!
//! # async fn example(config: CatalogConfig) -> core_auth::Result<()> {
//! let flow = OAuthFlowManager::new(OAuthConfig::from_catalog_config(&config), config.http_client.clone());
//! let (auth_url, verifier) = flow.build_auth_url()?;
//! println!("Visit: {}", auth_url);
//! # let callback = String::new();
//! let tokens = flow.complete_authorization(&callback, &verifier).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::CatalogConfig;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Attempts made by `refresh_access_token` before giving up on 5xx answers.
const MAX_REFRESH_ATTEMPTS: u32 = 3;

/// Endpoints and credentials for the authorization code flow.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    /// Absent for public (PKCE-only) clients
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    /// Derive the flow settings from the catalog configuration.
    pub fn from_catalog_config(config: &CatalogConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            auth_url: format!("{}/authorize", config.accounts_base_url),
            token_url: format!("{}/api/token", config.accounts_base_url),
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// PKCE code verifier plus the CSRF `state` of one authorization attempt.
///
/// Only the challenge derived from the verifier leaves the process during
/// authorization; the verifier itself is sent with the code exchange.
#[derive(Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// 32 random bytes of verifier and 32 of state, URL-safe base64 without
    /// padding (43 characters each).
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        let mut random_token = || {
            let mut bytes = [0u8; 32];
            rng.fill(&mut bytes);
            URL_SAFE_NO_PAD.encode(bytes)
        };

        let verifier = random_token();
        let state = random_token();
        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(verifier))
    pub fn challenge(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(self.verifier.as_bytes()))
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PkceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceVerifier")
            .field("verifier", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

/// Drives the authorization code flow against the accounts service.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    retry_base_delay: Duration,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            retry_base_delay: Duration::from_millis(100),
        }
    }

    /// Override the base delay of the refresh backoff (doubles per attempt).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the URL the user must visit to grant access.
    ///
    /// Returns the URL together with the verifier that must be handed back to
    /// [`parse_callback`](Self::parse_callback) and the code exchange.
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", verifier.state())
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", &verifier.challenge());

        debug!(scopes = self.config.scopes.len(), "Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Extract the authorization code from the callback URL.
    ///
    /// # Errors
    ///
    /// - `AuthorizationDenied` when the callback carries `error=...`
    /// - `StateMismatch` when `state` differs from the verifier's
    /// - `InvalidAuthCode` when the URL cannot be parsed or has no code
    pub fn parse_callback(&self, callback_url: &str, verifier: &PkceVerifier) -> Result<String> {
        let url = Url::parse(callback_url.trim())
            .map_err(|e| AuthError::InvalidAuthCode(format!("Unparseable callback URL: {}", e)))?;
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        if let Some(error) = query.get("error") {
            warn!(error = %error, "Authorization was denied");
            return Err(AuthError::AuthorizationDenied(error.clone()));
        }

        let state = query.get("state").map(String::as_str).unwrap_or_default();
        if state != verifier.state() {
            warn!("OAuth state mismatch in callback");
            return Err(AuthError::StateMismatch {
                expected: verifier.state().to_string(),
                actual: state.to_string(),
            });
        }

        query
            .get("code")
            .filter(|code| !code.is_empty())
            .cloned()
            .ok_or_else(|| AuthError::InvalidAuthCode("Callback carries no code".to_string()))
    }

    /// Parse the callback and exchange its code in one step.
    pub async fn complete_authorization(
        &self,
        callback_url: &str,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        let code = self.parse_callback(callback_url, verifier)?;
        self.exchange_code(&code, verifier).await
    }

    /// Exchange an authorization code for tokens.
    #[instrument(skip(self, code, verifier))]
    pub async fn exchange_code(&self, code: &str, verifier: &PkceVerifier) -> Result<OAuthTokens> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier.verifier()),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .http_client
            .execute(self.token_request(&params)?)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let reason = token_error_reason(&response);
            warn!(status = response.status, error = %reason, "Authorization code exchange failed");
            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                response.status, reason
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        info!(
            expires_in = token_response.expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Authorization code exchanged for tokens"
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        ))
    }

    /// Obtain a fresh access token with a refresh token.
    ///
    /// The previous refresh token is kept when the response omits one.
    /// 4xx answers fail immediately; 5xx answers are retried with
    /// exponential backoff up to three attempts.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        debug!("Refreshing access token");

        let mut attempts = 0;
        loop {
            attempts += 1;

            let response = self
                .http_client
                .execute(self.token_request(&params)?)
                .await
                .map_err(|e| AuthError::TokenRefreshFailed(e.to_string()))?;

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;

                info!(
                    expires_in = token_response.expires_in,
                    "Access token refreshed"
                );

                return Ok(OAuthTokens::new(
                    token_response.access_token,
                    token_response
                        .refresh_token
                        .or_else(|| Some(refresh_token.to_string())),
                    token_response.expires_in,
                ));
            }

            let status = response.status;
            let reason = token_error_reason(&response);

            if response.is_client_error() {
                warn!(status, error = %reason, "Token refresh rejected");
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, reason
                )));
            }

            if attempts >= MAX_REFRESH_ATTEMPTS {
                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, reason
                )));
            }

            let delay = self.retry_base_delay * 2u32.pow(attempts - 1);
            warn!(
                status,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Token refresh failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn token_request(&self, params: &[(&str, &str)]) -> Result<HttpRequest> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .header("Accept", "application/json");

        let request = match &self.config.client_secret {
            Some(secret) => request.basic_auth(&self.config.client_id, secret),
            None => {
                form.push(("client_id", self.config.client_id.as_str()));
                request
            }
        };

        let body = serde_urlencoded::to_string(&form)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        Ok(request.form(body))
    }
}

/// Successful answer of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Error answer of the token endpoint (`{"error", "error_description"}`).
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn token_error_reason(response: &HttpResponse) -> String {
    match response.json::<TokenErrorResponse>() {
        Ok(err) => match err.error_description {
            Some(description) => format!("{} ({})", err.error, description),
            None => err.error,
        },
        Err(_) => response
            .text()
            .unwrap_or_else(|_| "Unable to read error response".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Serves queued responses in order and records every request.
    #[derive(Default)]
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn with(responses: Vec<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| BridgeError::OperationFailed("no scripted response".to_string()))
        }
    }

    fn config(secret: Option<&str>) -> OAuthConfig {
        OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: secret.map(str::to_string),
            redirect_uri: "http://localhost:8888/callback".to_string(),
            scopes: vec![
                "user-library-read".to_string(),
                "playlist-modify-public".to_string(),
            ],
            auth_url: "https://accounts.example.com/authorize".to_string(),
            token_url: "https://accounts.example.com/api/token".to_string(),
        }
    }

    fn manager(secret: Option<&str>, http: Arc<ScriptedHttpClient>) -> OAuthFlowManager {
        OAuthFlowManager::new(config(secret), http).with_retry_base_delay(Duration::ZERO)
    }

    fn body_pairs(request: &HttpRequest) -> HashMap<String, String> {
        let body = request.body.clone().unwrap_or_default();
        serde_urlencoded::from_bytes(&body).unwrap()
    }

    #[test]
    fn test_pkce_verifier_generation() {
        let verifier = PkceVerifier::new();
        assert_eq!(verifier.verifier().len(), 43);
        assert_eq!(verifier.state().len(), 43);
        assert_eq!(verifier.challenge(), verifier.challenge());

        let other = PkceVerifier::new();
        assert_ne!(verifier.verifier(), other.verifier());
        assert_ne!(verifier.state(), other.state());
    }

    #[test]
    fn test_pkce_challenge_known_vector() {
        // RFC 7636 Appendix B
        let verifier = PkceVerifier {
            verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            state: "s".to_string(),
        };
        assert_eq!(
            verifier.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_from_catalog_config_derives_endpoints() {
        let catalog = CatalogConfig::builder()
            .client_id("cid")
            .redirect_uri("http://localhost/cb")
            .accounts_base_url("http://127.0.0.1:9000/")
            .scope("user-read-email")
            .http_client(ScriptedHttpClient::with(vec![]))
            .build()
            .unwrap();

        let config = OAuthConfig::from_catalog_config(&catalog);
        assert_eq!(config.auth_url, "http://127.0.0.1:9000/authorize");
        assert_eq!(config.token_url, "http://127.0.0.1:9000/api/token");
        assert_eq!(config.scopes, vec!["user-read-email"]);
    }

    #[test]
    fn test_build_auth_url() {
        let flow = manager(Some("secret"), ScriptedHttpClient::with(vec![]));
        let (url, verifier) = flow.build_auth_url().unwrap();

        let parsed = Url::parse(&url).unwrap();
        let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.path(), "/authorize");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "test-client");
        assert_eq!(query["scope"], "user-library-read playlist-modify-public");
        assert_eq!(query["redirect_uri"], "http://localhost:8888/callback");
        assert_eq!(query["state"], verifier.state());
        assert_eq!(query["code_challenge"], verifier.challenge());
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn test_build_auth_url_invalid_url() {
        let mut bad = config(None);
        bad.auth_url = "not a valid url".to_string();
        let flow = OAuthFlowManager::new(bad, ScriptedHttpClient::with(vec![]));
        assert!(flow.build_auth_url().is_err());
    }

    #[test]
    fn test_parse_callback_returns_code() {
        let flow = manager(None, ScriptedHttpClient::with(vec![]));
        let verifier = PkceVerifier::new();
        let callback = format!(
            "http://localhost:8888/callback?code=AQB123&state={}",
            verifier.state()
        );

        assert_eq!(flow.parse_callback(&callback, &verifier).unwrap(), "AQB123");
    }

    #[test]
    fn test_parse_callback_state_mismatch() {
        let flow = manager(None, ScriptedHttpClient::with(vec![]));
        let verifier = PkceVerifier::new();

        let result = flow.parse_callback(
            "http://localhost:8888/callback?code=AQB123&state=forged",
            &verifier,
        );
        assert!(matches!(
            result,
            Err(AuthError::StateMismatch { actual, .. }) if actual == "forged"
        ));
    }

    #[test]
    fn test_parse_callback_denied() {
        let flow = manager(None, ScriptedHttpClient::with(vec![]));
        let verifier = PkceVerifier::new();
        let callback = format!(
            "http://localhost:8888/callback?error=access_denied&state={}",
            verifier.state()
        );

        assert!(matches!(
            flow.parse_callback(&callback, &verifier),
            Err(AuthError::AuthorizationDenied(reason)) if reason == "access_denied"
        ));
    }

    #[test]
    fn test_parse_callback_missing_code() {
        let flow = manager(None, ScriptedHttpClient::with(vec![]));
        let verifier = PkceVerifier::new();
        let callback = format!("http://localhost:8888/callback?state={}", verifier.state());

        assert!(matches!(
            flow.parse_callback(&callback, &verifier),
            Err(AuthError::InvalidAuthCode(_))
        ));
        assert!(matches!(
            flow.parse_callback("not a url", &verifier),
            Err(AuthError::InvalidAuthCode(_))
        ));
    }

    #[tokio::test]
    async fn test_exchange_code_uses_basic_auth() {
        let http = ScriptedHttpClient::with(vec![HttpResponse::new(
            200,
            r#"{"access_token":"BQDnew","token_type":"Bearer","expires_in":3600,"refresh_token":"AQDrefresh"}"#,
        )]);
        let flow = manager(Some("secret"), http.clone());
        let verifier = PkceVerifier::new();

        let tokens = flow.exchange_code("AQB123", &verifier).await.unwrap();
        assert_eq!(tokens.access_token, "BQDnew");
        assert_eq!(tokens.refresh_token.as_deref(), Some("AQDrefresh"));
        assert!(!tokens.is_expired());

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://accounts.example.com/api/token");
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Basic dGVzdC1jbGllbnQ6c2VjcmV0".to_string())
        );

        let form = body_pairs(request);
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "AQB123");
        assert_eq!(form["redirect_uri"], "http://localhost:8888/callback");
        assert_eq!(form["code_verifier"], verifier.verifier());
        assert!(!form.contains_key("client_id"));
    }

    #[tokio::test]
    async fn test_exchange_code_public_client_sends_client_id() {
        let http = ScriptedHttpClient::with(vec![HttpResponse::new(
            200,
            r#"{"access_token":"BQDnew"}"#,
        )]);
        let flow = manager(None, http.clone());

        let tokens = flow
            .exchange_code("AQB123", &PkceVerifier::new())
            .await
            .unwrap();
        assert!(tokens.refresh_token.is_none());

        let request = &http.requests()[0];
        assert!(!request.headers.contains_key("Authorization"));
        assert_eq!(body_pairs(request)["client_id"], "test-client");
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let http = ScriptedHttpClient::with(vec![HttpResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#,
        )]);
        let flow = manager(Some("secret"), http);

        let result = flow.exchange_code("bad", &PkceVerifier::new()).await;
        match result {
            Err(AuthError::InvalidAuthCode(message)) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_refresh_token() {
        let http = ScriptedHttpClient::with(vec![HttpResponse::new(
            200,
            r#"{"access_token":"BQDfresh","expires_in":3600}"#,
        )]);
        let flow = manager(Some("secret"), http.clone());

        let tokens = flow.refresh_access_token("AQDold").await.unwrap();
        assert_eq!(tokens.access_token, "BQDfresh");
        assert_eq!(tokens.refresh_token.as_deref(), Some("AQDold"));

        let form = body_pairs(&http.requests()[0]);
        assert_eq!(form["grant_type"], "refresh_token");
        assert_eq!(form["refresh_token"], "AQDold");
    }

    #[tokio::test]
    async fn test_refresh_retries_server_errors() {
        let http = ScriptedHttpClient::with(vec![
            HttpResponse::new(503, ""),
            HttpResponse::new(502, ""),
            HttpResponse::new(200, r#"{"access_token":"BQDfresh","refresh_token":"AQDnew"}"#),
        ]);
        let flow = manager(Some("secret"), http.clone());

        let tokens = flow.refresh_access_token("AQDold").await.unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("AQDnew"));
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_gives_up_after_three_attempts() {
        let http = ScriptedHttpClient::with(vec![
            HttpResponse::new(500, ""),
            HttpResponse::new(500, ""),
            HttpResponse::new(500, ""),
            HttpResponse::new(200, r#"{"access_token":"never"}"#),
        ]);
        let flow = manager(Some("secret"), http.clone());

        let result = flow.refresh_access_token("AQDold").await;
        assert!(matches!(result, Err(AuthError::TokenRefreshFailed(_))));
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_client_error_fails_immediately() {
        let http = ScriptedHttpClient::with(vec![HttpResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#,
        )]);
        let flow = manager(Some("secret"), http.clone());

        let result = flow.refresh_access_token("AQDrevoked").await;
        assert!(matches!(result, Err(AuthError::TokenRefreshFailed(msg)) if msg.contains("revoked")));
        assert_eq!(http.requests().len(), 1);
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"token"}"#).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600);
    }
}
