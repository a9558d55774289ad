//! Error types for the tracked-object cache.

use crate::types::RemoteError;
use thiserror::Error;

/// Error class the server uses to signal that a TOI no longer exists.
pub const NONEXISTENT_CLASS: &str = "ToiNonexistantError";

/// Main error type for requester operations.
#[derive(Clone, Debug, Error)]
pub enum ToiError {
    /// The remote object does not exist (or no longer exists).
    #[error("TOI does not exist: {0}")]
    ObjectGone(RemoteError),

    /// Any other error payload delivered by the transport.
    #[error("Transport error: {0}")]
    Transport(RemoteError),

    #[error("Malformed link message: {0}")]
    Malformed(String),
}

impl ToiError {
    /// Classify a remote error payload.
    pub fn from_remote(error: RemoteError) -> Self {
        if error.class.as_deref() == Some(NONEXISTENT_CLASS) {
            ToiError::ObjectGone(error)
        } else {
            ToiError::Transport(error)
        }
    }

    /// True if the object is permanently gone on the server.
    pub fn is_object_gone(&self) -> bool {
        matches!(self, ToiError::ObjectGone(_))
    }

    /// The remote payload, if this error came from the transport.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ToiError::ObjectGone(e) | ToiError::Transport(e) => Some(e),
            ToiError::Malformed(_) => None,
        }
    }
}

impl From<serde_json::Error> for ToiError {
    fn from(e: serde_json::Error) -> Self {
        ToiError::Malformed(e.to_string())
    }
}

/// Result type for requester operations.
pub type Result<T> = std::result::Result<T, ToiError>;
