use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Dense embeddings were requested without a configured credential.
    /// Never surfaced to callers; only drives backend selection.
    #[error("Dense embedding backend is not enabled")]
    BackendUnavailable,

    /// The remote embedding provider failed (network, auth, quota, decode).
    #[error("Embedding call failed: {0}")]
    EmbeddingCallFailed(String),

    /// Writing the snapshot files failed. In-memory state has already
    /// changed when this surfaces from ingest.
    #[error("Persist failed: {0}")]
    PersistFailed(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create an embedding-call error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingCallFailed(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
