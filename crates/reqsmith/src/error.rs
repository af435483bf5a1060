//! Error types for request building, transport and body codecs

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, sending or decoding a request
#[derive(Debug, Error)]
pub enum Error {
    /// Base URL failed validation (scheme or host)
    #[error("Invalid base URL: {0}")]
    InvalidBase(String),

    /// Request URI could not be parsed
    #[error("Invalid request URI: {0}")]
    Url(#[from] url::ParseError),

    /// Request body could not be encoded
    #[error("Body encode error: {0}")]
    Encode(String),

    /// Response body could not be decoded
    #[error("Body decode error: {0}")]
    Decode(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transport-level request failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Client build error
    #[error("Client build error: {0}")]
    Build(String),

    /// Response body read error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Connection(err.to_string())
        } else if err.is_builder() {
            Error::Build(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}
