//! CLI error types and conversions

use crate::downloader::DownloadError;
use crate::input::InputError;
use crate::output::OutputError;
use crate::quota::QuotaError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Series input error
    #[error("input error: {0}")]
    InputError(#[from] InputError),

    /// Download error
    #[error("download error: {0}")]
    DownloadError(#[from] DownloadError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Quota ledger error
    #[error("quota error: {0}")]
    QuotaError(#[from] QuotaError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
