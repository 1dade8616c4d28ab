use thiserror::Error;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("no frames found in {0}")]
    EmptySequence(String),
}
