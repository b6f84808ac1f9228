//! Error handling for jarhttp
//!
//! Request outcomes are never reported through this type: a failed request is
//! an [`ErrorResult`](crate::http::response::ErrorResult) value. `Error` covers
//! the paths that can fail before or after a request is made, such as building
//! the transport or writing output.

use thiserror::Error;

/// Main error type for jarhttp operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for jarhttp operations
pub type Result<T> = std::result::Result<T, Error>;
