// ABOUTME: Error types for the auto-slides application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlidesError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to fetch remote resource: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PPTX generation error: {0}")]
    PptxError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl From<anyhow::Error> for SlidesError {
    fn from(err: anyhow::Error) -> Self {
        SlidesError::UnknownError(err.to_string())
    }
}

impl From<zip::result::ZipError> for SlidesError {
    fn from(err: zip::result::ZipError) -> Self {
        SlidesError::PptxError(format!("ZIP operation failed: {}", err))
    }
}

impl From<serde_json::Error> for SlidesError {
    fn from(err: serde_json::Error) -> Self {
        SlidesError::UpstreamError(format!("Malformed JSON: {}", err))
    }
}

impl From<image::ImageError> for SlidesError {
    fn from(err: image::ImageError) -> Self {
        SlidesError::ImageError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlidesError>;
