use thiserror::Error;

/// Failures at the edges of the core: files and blobs. Analysis and state
/// transitions never fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported project version '{0}'")]
    UnsupportedVersion(String),
}

pub type Result<T> = std::result::Result<T, Error>;
