use thiserror::Error;

/// Why a text-generation backend could not produce a response.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("build LLM: {0}")]
    Build(String),
    #[error("chat: {0}")]
    Chat(String),
    #[error("backend returned empty text")]
    Empty,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("backend is not configured")]
    NotConfigured,
    #[error("backend timed out after {0}s")]
    Timeout(u64),
}
