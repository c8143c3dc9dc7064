//! Error types for the Spotify Web API transport

use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Status, API error code and message of a failed response.
///
/// The Web API reports failures as `{"error": {"status": 404, "message":
/// "..."}}`; `code` is that inner status, `0` when the body carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub status: u16,
    pub code: u32,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Regular {
        #[serde(default)]
        status: u32,
        #[serde(default)]
        message: String,
    },
    // accounts service style: {"error": "invalid_client", "error_description": "..."}
    Plain(String),
}

impl ApiErrorDetails {
    /// Extract the details from a failed response body.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope {
                error: ErrorPayload::Regular { status: code, message },
                ..
            }) => Self {
                status,
                code,
                message,
            },
            Ok(ErrorEnvelope {
                error: ErrorPayload::Plain(error),
                error_description,
            }) => Self {
                status,
                code: 0,
                message: error_description.unwrap_or(error),
            },
            Err(_) => Self {
                status,
                code: 0,
                message: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(status {}, error code {})", self.status, self.code)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Transport errors of the Web API client
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// 403 response
    #[error("Forbidden {0}")]
    Forbidden(ApiErrorDetails),

    /// 404 response
    #[error("Not found {0}")]
    NotFound(ApiErrorDetails),

    /// 5xx response, after retries where the status is retryable
    #[error("Server error {0}")]
    ServerError(ApiErrorDetails),

    /// Any other non-2xx response
    #[error("HTTP error {0}")]
    Http(ApiErrorDetails),

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// The request could not be built from its arguments
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for Web API operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl SpotifyError {
    /// Classify a non-2xx response that is not retried (any more).
    pub fn from_status(details: ApiErrorDetails) -> Self {
        match details.status {
            403 => SpotifyError::Forbidden(details),
            404 => SpotifyError::NotFound(details),
            s if s >= 500 => SpotifyError::ServerError(details),
            _ => SpotifyError::Http(details),
        }
    }

    /// Details of a status-derived error.
    pub fn details(&self) -> Option<&ApiErrorDetails> {
        match self {
            SpotifyError::Forbidden(d)
            | SpotifyError::NotFound(d)
            | SpotifyError::ServerError(d)
            | SpotifyError::Http(d) => Some(d),
            _ => None,
        }
    }

    /// HTTP status of a status-derived error.
    pub fn status(&self) -> Option<u16> {
        self.details().map(|d| d.status)
    }
}
