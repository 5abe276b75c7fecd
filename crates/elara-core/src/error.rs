use thiserror::Error;

/// Error taxonomy shared across the workspace (spec §7).
#[derive(Debug, Error)]
pub enum ElaraError {
    #[error("signature verification failed")]
    InvalidSignature,

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("unknown parent record: {0}")]
    UnknownParent(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<sled::Error> for ElaraError {
    fn from(e: sled::Error) -> Self {
        ElaraError::Storage(e.to_string())
    }
}

impl From<bincode::Error> for ElaraError {
    fn from(e: bincode::Error) -> Self {
        ElaraError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for ElaraError {
    fn from(e: serde_json::Error) -> Self {
        ElaraError::Serialization(e.to_string())
    }
}
