use core_auth::AuthError;
use provider_spotify::SpotifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Classified failure of the Web API transport, propagated unchanged
    #[error(transparent)]
    Transport(#[from] SpotifyError),

    /// The record's discriminator names no known entity
    #[error("Unsupported entity kind: {0}")]
    UnsupportedEntityKind(String),

    /// An `added_at` wrapper without endpoint context carries zero or
    /// several recognized kind keys
    #[error("Cannot tell the kind of a list item, candidates: {candidates:?}")]
    AmbiguousListItem { candidates: Vec<String> },

    #[error("Expected a {expected} entity, got {actual}")]
    UnexpectedEntityKind { expected: String, actual: String },

    #[error("Failed to decode {kind} record: {message}")]
    Decode { kind: String, message: String },

    #[error("Invalid argument: {field} - {message}")]
    InvalidArgument { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<AuthError> for CatalogError {
    fn from(error: AuthError) -> Self {
        CatalogError::Transport(SpotifyError::Auth(error))
    }
}

impl CatalogError {
    pub(crate) fn decode(kind: &str, message: impl ToString) -> Self {
        CatalogError::Decode {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }

    /// The transport error behind this one, if any.
    pub fn transport(&self) -> Option<&SpotifyError> {
        match self {
            CatalogError::Transport(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Transport(SpotifyError::NotFound(_)))
    }

    /// Token acquisition or user authorization failed.
    pub fn is_authorization(&self) -> bool {
        matches!(self, CatalogError::Transport(SpotifyError::Auth(_)))
    }
}
