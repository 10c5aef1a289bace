//! Batch planning, request execution and pipeline orchestration
//!
//! # Overview
//!
//! 1. **Planning**: [`batch::plan`] splits identifiers into batches of at most 50
//! 2. **Execution**: [`executor::RequestExecutor`] sends one batch, metering every
//!    attempt against the [`crate::quota::QuotaLedger`] and retrying transient failures
//! 3. **Orchestration**: [`pipeline::SeriesPipeline`] runs batches strictly in order,
//!    pauses between successful batches, then normalizes and deduplicates
//!
//! # Error Handling
//!
//! [`ApiError`] separates caller mistakes (`InvalidArgument`, never metered)
//! from service trouble (`Exhausted`, metered per attempt). Only
//! `TransientHttpError` and `NetworkError` are retried.

pub mod batch;
pub mod config;
pub mod executor;
pub mod job;
pub mod pipeline;
pub mod progress;

pub use batch::{plan, plan_default, BatchPlan, SeriesBatch};
pub use config::ClientConfig;
pub use executor::RequestExecutor;
pub use job::{DownloadJob, JobReport};
pub use pipeline::SeriesPipeline;
pub use progress::BatchProgress;

use crate::quota::QuotaError;

/// Errors from executing a batch request
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Precondition violation; nothing was metered or sent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Quota ledger failure, including the daily limit
    #[error("quota error: {0}")]
    Quota(#[from] QuotaError),

    /// 5xx status in the retryable set
    #[error("transient HTTP error: {0}")]
    TransientHttpError(u16),

    /// Connection, DNS or timeout failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Any other non-200 status
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Well-formed response whose payload status is not success
    #[error("API rejected request with status {status}")]
    ApiRejected {
        /// Payload status string
        status: String,
        /// Messages returned alongside the rejection
        messages: Vec<String>,
    },

    /// 200 response that could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Retryable failures on every attempt
    #[error("request failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last: Box<ApiError>,
    },
}

impl ApiError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::TransientHttpError(_) | ApiError::NetworkError(_)
        )
    }

    /// Whether the daily limit was hit
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ApiError::Quota(QuotaError::Exceeded { .. }))
    }
}

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A batch request failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The pipeline could not be built from configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}
