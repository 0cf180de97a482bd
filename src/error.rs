use thiserror::Error;

/// Top-level client errors.
#[derive(Debug, Error)]
pub enum GiltError {
    #[error("sdk error: {0}")]
    Castgate(#[from] castgate::CastgateError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
