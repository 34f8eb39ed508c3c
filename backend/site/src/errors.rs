//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template {0} not found")]
    TemplateNotFound(String),

    #[error("Rasterizer error: {0}")]
    Rasterizer(String),
}

pub type Result<T> = std::result::Result<T, SiteError>;
