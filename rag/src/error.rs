use thiserror::Error;

/// Errors raised while building or running a retrieval chain.
#[derive(Error, Debug)]
pub enum RagError {
    /// Bad or missing local configuration: unknown chain name, missing API
    /// key, malformed template, unreadable setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The remote embedding or completion service failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
