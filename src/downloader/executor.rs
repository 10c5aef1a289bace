//! Request executor: one batch, up to three metered attempts
//!
//! Per attempt: meter a call on the ledger, send, classify. Retryable
//! failures (5xx in the retryable set, network errors) back off `2^attempt`
//! seconds and try again; everything else stops immediately. Each attempt
//! logs exactly one event: `info` on success, `warn` on a retryable failure,
//! `error` on a fatal one.

use crate::downloader::batch::SeriesBatch;
use crate::downloader::config::{
    calculate_backoff, MAX_ATTEMPTS, MAX_SERIES_PER_REQUEST, MAX_YEAR_SPAN,
};
use crate::downloader::ApiError;
use crate::fetcher::retry_formatter::{AttemptContext, AttemptOutcome, FailureKind};
use crate::fetcher::{ApiResponse, SeriesRequest, SeriesTransport, TransportError};
use crate::metrics::{record_attempt, record_retry_backoff};
use crate::quota::QuotaLedger;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What the loop does after one attempt
enum Step {
    Done(ApiResponse),
    Retry(ApiError, FailureKind),
    Abort(ApiError, FailureKind),
}

/// Executes batch requests against a transport, metered by a quota ledger
pub struct RequestExecutor {
    transport: Arc<dyn SeriesTransport>,
    ledger: Arc<QuotaLedger>,
    registration_key: Option<String>,
    max_attempts: u32,
}

impl RequestExecutor {
    /// Executor with the default attempt budget and no registration key
    pub fn new(transport: Arc<dyn SeriesTransport>, ledger: Arc<QuotaLedger>) -> Self {
        Self {
            transport,
            ledger,
            registration_key: None,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Send `key` with every request
    pub fn with_registration_key(mut self, key: Option<String>) -> Self {
        self.registration_key = key;
        self
    }

    /// Set attempts per batch (at least one)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Attempts per batch
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Ledger metering this executor
    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    /// Check request preconditions without touching the ledger or network
    pub fn validate(batch: &SeriesBatch, start_year: i32, end_year: i32) -> Result<(), ApiError> {
        if batch.is_empty() {
            return Err(ApiError::InvalidArgument("empty series batch".to_string()));
        }
        if batch.len() > MAX_SERIES_PER_REQUEST {
            return Err(ApiError::InvalidArgument(format!(
                "series limit exceeded: {} identifiers (max {MAX_SERIES_PER_REQUEST})",
                batch.len()
            )));
        }
        if start_year > end_year {
            return Err(ApiError::InvalidArgument(format!(
                "start year {start_year} is after end year {end_year}"
            )));
        }
        let span = i64::from(end_year) - i64::from(start_year);
        if span > i64::from(MAX_YEAR_SPAN) {
            return Err(ApiError::InvalidArgument(format!(
                "year range exceeded: {start_year} to {end_year} spans {span} years (max {MAX_YEAR_SPAN})"
            )));
        }
        Ok(())
    }

    /// Execute one batch request.
    ///
    /// # Errors
    /// - `InvalidArgument` before any ledger or network activity
    /// - `Quota` when the ledger refuses a call (no request is sent)
    /// - `HttpError`, `ApiRejected`, `MalformedResponse` on the first occurrence
    /// - `Exhausted` after every attempt failed with a retryable error
    pub async fn execute(
        &self,
        batch: SeriesBatch,
        start_year: i32,
        end_year: i32,
    ) -> Result<ApiResponse, ApiError> {
        Self::validate(&batch, start_year, end_year)?;

        let batch_index = batch.index;
        let batch_size = batch.len();
        let request = SeriesRequest::new(
            batch.series_ids,
            start_year,
            end_year,
            self.registration_key.clone(),
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let call_number = self.ledger.before_call()?;

            let context = AttemptContext {
                attempt,
                max_attempts: self.max_attempts,
                call_number,
                batch_size,
                start_year,
                end_year,
            };

            match self.attempt_once(&request).await {
                Step::Done(response) => {
                    let outcome = AttemptOutcome::Succeeded;
                    record_attempt(outcome.label());
                    info!(
                        batch = batch_index,
                        attempt,
                        call_number,
                        response_time_ms = response.response_time,
                        "{}",
                        context.format(&outcome)
                    );
                    return Ok(response);
                }
                Step::Retry(err, kind) if attempt < self.max_attempts => {
                    let backoff = calculate_backoff(attempt);
                    let outcome = AttemptOutcome::Retrying { kind, backoff };
                    record_attempt(outcome.label());
                    record_retry_backoff(backoff, attempt);
                    warn!(
                        batch = batch_index,
                        attempt,
                        call_number,
                        error = %err,
                        "{}",
                        context.format(&outcome)
                    );
                    tokio::time::sleep(backoff).await;
                }
                Step::Retry(err, kind) => {
                    let outcome = AttemptOutcome::Exhausted(kind);
                    record_attempt(outcome.label());
                    warn!(
                        batch = batch_index,
                        attempt,
                        call_number,
                        error = %err,
                        "{}",
                        context.format(&outcome)
                    );
                    return Err(ApiError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Step::Abort(err, kind) => {
                    let outcome = AttemptOutcome::Fatal(kind);
                    record_attempt(outcome.label());
                    error!(
                        batch = batch_index,
                        attempt,
                        call_number,
                        error = %err,
                        "{}",
                        context.format(&outcome)
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn attempt_once(&self, request: &SeriesRequest) -> Step {
        match self.transport.post_series(request).await {
            Ok(response) if response.is_succeeded() => Step::Done(response),
            Ok(response) => {
                let status = response.status.as_str().to_string();
                let kind = FailureKind::Rejected(status.clone());
                Step::Abort(
                    ApiError::ApiRejected {
                        status,
                        messages: response.messages,
                    },
                    kind,
                )
            }
            Err(err) => {
                let kind = FailureKind::from_transport(&err);
                let api_error = match err {
                    TransportError::Status { status, .. } if kind.is_retryable() => {
                        ApiError::TransientHttpError(status)
                    }
                    TransportError::Status { status, .. } => ApiError::HttpError(status),
                    TransportError::Network(message) => ApiError::NetworkError(message),
                    TransportError::Decode(message) => ApiError::MalformedResponse(message),
                };
                if api_error.is_retryable() {
                    Step::Retry(api_error, kind)
                } else {
                    Step::Abort(api_error, kind)
                }
            }
        }
    }
}
