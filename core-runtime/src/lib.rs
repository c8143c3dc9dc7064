//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the catalog client:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other crates depend
//! on. It establishes the logging conventions and the configuration object
//! through which credentials, endpoint URLs and the host `HttpClient` reach
//! the rest of the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CatalogConfig, CatalogConfigBuilder};
pub use error::{Error, Result};
