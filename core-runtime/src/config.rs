//! # Catalog Configuration Module
//!
//! Provides configuration management for the catalog client.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CatalogConfig` instance that holds the application credentials, endpoint
//! base URLs and the injected `HttpClient`. It enforces fail-fast validation
//! so that a misconfigured client never reaches the network.
//!
//! ## Required Settings
//!
//! - `client_id` - Application id registered with the accounts service
//! - `redirect_uri` - Callback URL registered for the authorization flow
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//!
//! When the `desktop-shims` feature is enabled, a `ReqwestHttpClient` is
//! injected automatically if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::builder()
//!     .client_id("my-client-id")
//!     .client_secret("my-client-secret")
//!     .redirect_uri("http://localhost:8888/callback")
//!     .scopes(["user-library-read", "playlist-modify-public"])
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ### From the environment
//!
//! ```ignore
//! let config = CatalogConfig::builder().from_env().build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default Web API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Default accounts service base URL
pub const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_CLIENT_ID: &str = "CATALOG_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CATALOG_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "CATALOG_REDIRECT_URI";
pub const ENV_SCOPES: &str = "CATALOG_SCOPES";
pub const ENV_REFRESH_TOKEN: &str = "CATALOG_REFRESH_TOKEN";
pub const ENV_API_BASE_URL: &str = "CATALOG_API_BASE_URL";

/// Configuration for the catalog client.
///
/// Use [`CatalogConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Application client id
    pub client_id: String,

    /// Application client secret (absent for PKCE public clients)
    pub client_secret: Option<String>,

    /// Registered redirect URI
    pub redirect_uri: String,

    /// OAuth scopes requested during authorization
    pub scopes: Vec<String>,

    /// Web API base URL, without trailing slash
    pub api_base_url: String,

    /// Accounts service base URL, without trailing slash
    pub accounts_base_url: String,

    /// Refresh token used to seed the token cache
    pub refresh_token: Option<String>,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,

    /// HTTP client for making API requests
    pub http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("api_base_url", &self.api_base_url)
            .field("accounts_base_url", &self.accounts_base_url)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("http_client", &"HttpClient { ... }")
            .finish()
    }
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Space-joined scope string as sent to the authorize endpoint.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Client id is not blank
    /// - Redirect URI and base URLs parse as absolute URLs
    /// - Request timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("Client id cannot be empty".to_string()));
        }

        if self
            .client_secret
            .as_deref()
            .is_some_and(|secret| secret.trim().is_empty())
        {
            return Err(Error::Config(
                "Client secret cannot be blank; omit it for PKCE public clients".to_string(),
            ));
        }

        validate_url("redirect_uri", &self.redirect_uri)?;
        validate_url("api_base_url", &self.api_base_url)?;
        validate_url("accounts_base_url", &self.accounts_base_url)?;

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.scopes.iter().any(|s| s.trim().is_empty() || s.contains(' ')) {
            return Err(Error::Config(
                "Scopes must be non-empty and contain no whitespace".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<()> {
    let invalid = |message: String| Error::InvalidUrl {
        field,
        value: value.to_string(),
        message,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()));
    }
    Ok(())
}

/// Split a scope list given as space- or comma-separated text.
pub fn parse_scope_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_user_agent() -> String {
    format!("catalog-client/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for API requests. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Other hosts: inject an implementation with .http_client()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout, user_agent).map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _timeout: Duration,
    _user_agent: &str,
) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

/// Builder for constructing [`CatalogConfig`] instances.
#[derive(Default)]
pub struct CatalogConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
    api_base_url: Option<String>,
    accounts_base_url: Option<String>,
    refresh_token: Option<String>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl CatalogConfigBuilder {
    /// Sets the application client id (required).
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the application client secret.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the registered redirect URI (required).
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Replaces the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Overrides the Web API base URL.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Overrides the accounts service base URL.
    pub fn accounts_base_url(mut self, url: impl Into<String>) -> Self {
        self.accounts_base_url = Some(url.into());
        self
    }

    /// Seeds the token cache with a refresh token.
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Injects the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Fills unset fields from `CATALOG_*` environment variables.
    ///
    /// Values already set on the builder win over the environment.
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.client_id.is_none() {
            self.client_id = read(ENV_CLIENT_ID);
        }
        if self.client_secret.is_none() {
            self.client_secret = read(ENV_CLIENT_SECRET);
        }
        if self.redirect_uri.is_none() {
            self.redirect_uri = read(ENV_REDIRECT_URI);
        }
        if self.scopes.is_empty() {
            if let Some(raw) = read(ENV_SCOPES) {
                self.scopes = parse_scope_list(&raw);
            }
        }
        if self.refresh_token.is_none() {
            self.refresh_token = read(ENV_REFRESH_TOKEN);
        }
        if self.api_base_url.is_none() {
            self.api_base_url = read(ENV_API_BASE_URL);
        }
        self
    }

    /// Builds the final `CatalogConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CatalogConfig)` on success, or an error if:
    /// - Required settings are missing (client id, redirect URI)
    /// - No `HttpClient` is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CatalogConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config("Client id is required. Use .client_id() to set it.".to_string())
        })?;

        let redirect_uri = self.redirect_uri.ok_or_else(|| {
            Error::Config(
                "Redirect URI is required. Use .redirect_uri() to set it.".to_string(),
            )
        })?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let user_agent = self.user_agent.unwrap_or_else(default_user_agent);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout, &user_agent)?,
        };

        let config = CatalogConfig {
            client_id,
            client_secret: self.client_secret,
            redirect_uri,
            scopes: self.scopes,
            api_base_url: trim_base(self.api_base_url, DEFAULT_API_BASE_URL),
            accounts_base_url: trim_base(self.accounts_base_url, DEFAULT_ACCOUNTS_BASE_URL),
            refresh_token: self.refresh_token,
            request_timeout,
            user_agent,
            http_client,
        };

        config.validate()?;

        Ok(config)
    }
}

fn trim_base(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}
