//! # Authentication Module
//!
//! OAuth 2.0 authorization code flow and access-token management for the
//! catalog client.
//!
//! ## Overview
//!
//! - [`OAuthFlowManager`]: authorization URL, callback parsing, code
//!   exchange and token refresh
//! - [`TokenManager`]: cached token set, single-flight refresh, interactive
//!   fallback through an [`AuthorizationPrompt`]
//! - [`AccessTokenProvider`]: the seam the transport layer asks for bearer
//!   tokens
//! - [`Scope`]: OAuth scopes understood by the accounts service

pub mod error;
pub mod manager;
pub mod oauth;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{
    AccessTokenProvider, AuthorizationPrompt, StaticTokenProvider, StdinPrompt, TokenManager,
};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use types::{OAuthTokens, Scope};
