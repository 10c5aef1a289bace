//! Attempt outcome classification and audit message formatting.
//!
//! Every request attempt ends in exactly one [`AttemptOutcome`]; the executor
//! logs the message built here once per attempt.

use super::TransportError;
use std::time::Duration;

/// HTTP statuses worth retrying
pub const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Whether an HTTP status belongs to the retryable set
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Classification of a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// 5xx in the retryable set
    ServerError(u16),
    /// Any other non-200 status
    HttpStatus(u16),
    /// No HTTP status: connection, DNS or timeout failure
    Network,
    /// 200 with a body that is not the expected JSON
    Malformed,
    /// 200 with a payload status other than success
    Rejected(String),
}

impl FailureKind {
    /// Classify a transport failure
    pub fn from_transport(err: &TransportError) -> Self {
        match err {
            TransportError::Status { status, .. } if is_retryable_status(*status) => {
                FailureKind::ServerError(*status)
            }
            TransportError::Status { status, .. } => FailureKind::HttpStatus(*status),
            TransportError::Network(_) => FailureKind::Network,
            TransportError::Decode(_) => FailureKind::Malformed,
        }
    }

    /// Whether another attempt can help
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::ServerError(_) | FailureKind::Network)
    }

    /// Short description used inside log messages
    pub fn description(&self) -> String {
        match self {
            FailureKind::ServerError(500) => "internal server error (500)".to_string(),
            FailureKind::ServerError(502) => "bad gateway (502)".to_string(),
            FailureKind::ServerError(503) => "service unavailable (503)".to_string(),
            FailureKind::ServerError(504) => "gateway timeout (504)".to_string(),
            FailureKind::ServerError(code) => format!("server error ({code})"),
            FailureKind::HttpStatus(code) => format!("HTTP error ({code})"),
            FailureKind::Network => "network error".to_string(),
            FailureKind::Malformed => "malformed response body".to_string(),
            FailureKind::Rejected(status) => format!("request rejected with status {status}"),
        }
    }

    /// Remediation hint for fatal failures
    pub fn suggestion(&self) -> &'static str {
        match self {
            FailureKind::ServerError(_) => "The service may be overloaded, try again later",
            FailureKind::HttpStatus(400) => "Check series identifiers and the year range",
            FailureKind::HttpStatus(401) | FailureKind::HttpStatus(403) => {
                "Verify the registration key"
            }
            FailureKind::HttpStatus(_) => "Review the request parameters and endpoint",
            FailureKind::Network => "Check network connectivity and DNS resolution",
            FailureKind::Malformed => "The endpoint returned an unexpected payload",
            FailureKind::Rejected(_) => {
                "Check the response messages; resending the same request will not help"
            }
        }
    }
}

/// Result of one attempt, as recorded in the audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Payload status was success
    Succeeded,
    /// Retryable failure; another attempt follows after `backoff`
    Retrying {
        /// What failed
        kind: FailureKind,
        /// Sleep before the next attempt
        backoff: Duration,
    },
    /// Retryable failure on the last attempt
    Exhausted(FailureKind),
    /// Non-retryable failure
    Fatal(FailureKind),
}

impl AttemptOutcome {
    /// Metric label for the outcome
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Succeeded => "succeeded",
            AttemptOutcome::Retrying { .. } => "retrying",
            AttemptOutcome::Exhausted(_) => "exhausted",
            AttemptOutcome::Fatal(_) => "fatal",
        }
    }
}

/// Context of a single attempt
#[derive(Debug, Clone)]
pub struct AttemptContext {
    /// Attempt number (1-based)
    pub attempt: u32,
    /// Attempts allowed per batch
    pub max_attempts: u32,
    /// Today's call number from the quota ledger
    pub call_number: u32,
    /// Identifiers in the batch
    pub batch_size: usize,
    /// First year requested
    pub start_year: i32,
    /// Last year requested
    pub end_year: i32,
}

impl AttemptContext {
    /// Audit line for the given outcome
    pub fn format(&self, outcome: &AttemptOutcome) -> String {
        let head = format!(
            "Request #{} (attempt {}/{}): {} series, {} to {}",
            self.call_number,
            self.attempt,
            self.max_attempts,
            self.batch_size,
            self.start_year,
            self.end_year
        );

        match outcome {
            AttemptOutcome::Succeeded => format!("{head} - succeeded"),
            AttemptOutcome::Retrying { kind, backoff } => format!(
                "{head} - {}, retrying in {:.1} seconds",
                kind.description(),
                backoff.as_secs_f64()
            ),
            AttemptOutcome::Exhausted(kind) => format!(
                "{head} - {}, giving up after {} attempts. {}",
                kind.description(),
                self.max_attempts,
                kind.suggestion()
            ),
            AttemptOutcome::Fatal(kind) => format!(
                "{head} - {}, not retrying. {}",
                kind.description(),
                kind.suggestion()
            ),
        }
    }
}
