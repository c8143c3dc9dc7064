use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("OAuth state mismatch: expected '{expected}', got '{actual}'")]
    StateMismatch { expected: String, actual: String },

    #[error("Authorization denied by user: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
