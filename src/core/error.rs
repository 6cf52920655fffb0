use thiserror::Error;

use crate::batch::BatchError;
use crate::conversion::ConversionError;
use crate::core::validation::ValidationError;
use crate::registry::RegistryError;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent error handling.
/// Uses `thiserror` for automatic error conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// File download errors
    #[error("Download error: {0}")]
    Download(#[from] teloxide::DownloadError),

    /// SVG validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// SVG to TGS conversion errors
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// User registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Batch coordination errors
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
