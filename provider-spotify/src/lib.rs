//! # Spotify Web API Provider
//!
//! Transport layer of the catalog client.
//!
//! ## Overview
//!
//! This module provides:
//! - [`Route`]: method, path and query of one endpoint call
//! - [`SpotifyHttp`]: authenticated requests with retry/backoff on
//!   transient failures and classified errors
//! - One wrapper per Web API endpoint, returning raw JSON records or
//!   [`Page`]s of them
//! - [`RetryPolicy`]: attempt limits and linear backoff

pub mod connector;
mod endpoints;
pub mod error;
pub mod retry;
pub mod route;
pub mod types;

pub use connector::{RequestBody, SpotifyHttp};
pub use error::{ApiErrorDetails, Result, SpotifyError};
pub use retry::RetryPolicy;
pub use route::Route;
pub use types::{
    NewPlaylist, Page, PageRequest, PlaylistDetails, MAX_BULK_IDS, MAX_LIBRARY_IDS,
    MAX_PLAYLIST_ADD, MAX_PLAYLIST_REMOVE, PAGE_CAP,
};
