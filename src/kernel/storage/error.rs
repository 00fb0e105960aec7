use std::fmt;

use crate::kernel::services::ports::BackendError;

#[derive(Debug)]
pub enum StoreError {
    EmptyKey,
    Backend(BackendError),
    Serialize(serde_json::Error),
    /// Stored text is not a valid entry envelope.
    Corrupted(String),
    /// Compressed / obfuscated payload failed to decode.
    Codec(String),
    TooLarge { size: usize, limit: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::EmptyKey => write!(f, "storage key must not be empty"),
            StoreError::Backend(e) => write!(f, "{}", e),
            StoreError::Serialize(e) => write!(f, "serialize failed: {}", e),
            StoreError::Corrupted(msg) => write!(f, "corrupted entry: {}", msg),
            StoreError::Codec(msg) => write!(f, "payload decode failed: {}", msg),
            StoreError::TooLarge { size, limit } => {
                write!(f, "entry too large ({} bytes, limit {})", size, limit)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(e) => Some(e),
            StoreError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(e: BackendError) -> Self {
        StoreError::Backend(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialize(e)
    }
}
