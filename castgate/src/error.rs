use thiserror::Error;

#[derive(Error, Debug)]
pub enum CastgateError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("sign-in surface could not be opened: {0}")]
    SurfaceOpen(String),

    #[error("value out of range: {0}")]
    Overflow(String),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CastgateError>;
