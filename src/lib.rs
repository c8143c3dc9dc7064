//! Workspace facade crate.
//!
//! Re-exports the public surface of the catalog client so host applications
//! can depend on `catalog-workspace` alone. The `desktop-shims` feature
//! (default) lets `CatalogConfig::build()` inject a reqwest-backed
//! `HttpClient` when none is supplied.

pub use core_auth as auth;
pub use core_catalog as catalog;
pub use core_runtime as runtime;

pub use bridge_traits::{BridgeError, HttpClient};
pub use core_auth::{AuthError, OAuthTokens, Scope};
pub use core_catalog::{
    Album, Artist, CatalogError, Client, ClientUser, Entity, ListItem, ListIterator, Playlist,
    Track, User,
};
pub use core_runtime::config::CatalogConfig;
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
