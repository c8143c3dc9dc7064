use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The peer reset the connection before a response arrived.
    ///
    /// Callers may treat this as transient and retry the request.
    #[error("Connection reset by peer: {0}")]
    ConnectionReset(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure is a transient transport condition worth retrying.
    pub fn is_connection_reset(&self) -> bool {
        match self {
            BridgeError::ConnectionReset(_) => true,
            BridgeError::Io(e) => e.kind() == std::io::ErrorKind::ConnectionReset,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
