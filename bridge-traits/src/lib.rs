//! # Host Bridge Traits
//!
//! Platform abstraction traits that the catalog client requires from its host.
//!
//! ## Overview
//!
//! The catalog core never talks to a socket directly. It receives an
//! [`HttpClient`](http::HttpClient) implementation at configuration time and
//! drives every API call through it. Desktop hosts use the reqwest-backed
//! adapter from `bridge-desktop`; tests inject stubs or `mockall` mocks.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Report connection resets as `BridgeError::ConnectionReset`
//! - Never treat a non-2xx status as an error (the caller classifies it)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single client can be shared
//! across tasks behind an `Arc`.

pub mod error;
pub mod http;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
