//! # BLS Data Downloader Library
//!
//! A quota-aware batched client for the Bureau of Labor Statistics public
//! time-series API. Pulls large sets of series identifiers while respecting
//! the provider's per-request and per-day limits, and flattens the nested
//! JSON responses into deduplicated records ready for storage.
//!
//! ## Features
//!
//! - **Daily Quota Ledger**: Durable call counter that survives restarts and
//!   rolls over at the day boundary
//! - **Batch Planning**: Splits identifier lists into provider-compliant batches
//! - **Two-Tier Retry**: Exponential backoff on 5xx, hard stop on rejections
//! - **Normalization**: Flat records plus structured diagnostics for
//!   partial-failure messages
//! - **Post-Processing**: Exact-duplicate removal and seasonal-adjustment tagging
//!
//! ## Quick Start
//!
//! ```no_run
//! use bls_data_downloader::downloader::{ClientConfig, DownloadJob, SeriesPipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default().with_registration_key("my-key");
//! let pipeline = SeriesPipeline::from_config(&config)?;
//!
//! let job = DownloadJob::new(vec!["LNS14000000".to_string()], 2000, 2005);
//! let report = pipeline.run(&job).await?;
//! println!("{} records", report.records.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`quota`] - Durable daily call ledger and its storage backends
//! - [`downloader`] - Batch planning, request execution, and the sequential pipeline
//! - [`fetcher`] - Wire types, HTTP transport, and response normalization
//! - [`transform`] - Deduplication and seasonal-adjustment tagging
//! - [`input`] - Series metadata CSV loader
//! - [`output`] - Record and series writers (CSV)

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Batch planning, request execution and pipeline orchestration
pub mod downloader;

/// Wire types, HTTP transport and response normalization
pub mod fetcher;

/// Series metadata input
pub mod input;

/// Metrics collection
pub mod metrics;

/// Record and series output writers
pub mod output;

/// Daily quota ledger
pub mod quota;

/// Post-processing passes over normalized data
pub mod transform;

/// One observation of one series, flattened out of an API response.
///
/// The natural key is `(series_id, year, period)`. A missing value is kept as
/// `None` rather than dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    /// Series identifier (e.g., "LNS14000000")
    pub series_id: String,
    /// Observation year; `None` only when the provider sent something unparseable
    pub year: Option<i32>,
    /// Period code (e.g., "M01", "Q02", "A01")
    pub period: String,
    /// Human-readable period name (e.g., "January")
    pub period_name: String,
    /// Observation value; `None` for the provider's "-" sentinel
    pub value: Option<f64>,
    /// Footnotes as compact JSON, `None` when the provider sent only empty footnotes
    pub footnotes: Option<String>,
}

impl NormalizedRecord {
    /// Uniqueness key used by the destination store
    pub fn key(&self) -> (&str, Option<i32>, &str) {
        (&self.series_id, self.year, &self.period)
    }
}

/// Whether a metadata row describes a national or a state series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// National series
    National,
    /// State series (rows carry a state name)
    State,
}

impl SeriesKind {
    /// Label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::National => "National",
            SeriesKind::State => "State",
        }
    }

    /// Prefix used for output file names
    pub fn file_prefix(&self) -> &'static str {
        match self {
            SeriesKind::National => "national",
            SeriesKind::State => "state",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SeriesKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "national" => Ok(SeriesKind::National),
            "state" => Ok(SeriesKind::State),
            _ => Err(format!(
                "Invalid series type: {s}. Valid options: national, state"
            )),
        }
    }
}

/// Descriptive metadata for a series, read from caller input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesMetadata {
    /// Series identifier
    pub series_id: String,
    /// Series name, cleaned of its adjustment suffix after tagging
    pub series_name: String,
    /// Seasonal adjustment flag; `None` when the name carries no suffix
    pub is_adjusted: Option<bool>,
    /// Survey code (e.g., "CES", "LN")
    pub survey_code: Option<String>,
    /// State name for state series
    pub state: Option<String>,
}

/// Non-fatal data-availability issue surfaced by normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,
}

/// Classification of a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The provider has no data for the series in the given year
    NoData {
        /// Series identifier
        series_id: String,
        /// Year without data
        year: i32,
    },
    /// The provider does not know the series
    UnknownSeries {
        /// Series identifier
        series_id: String,
    },
    /// A message that matched no known pattern
    Unrecognized {
        /// Raw message text
        raw: String,
    },
    /// A data point with fields that could not be parsed
    Malformed {
        /// Series the data point belongs to
        series_id: String,
        /// What could not be parsed
        detail: String,
    },
}

impl DiagnosticKind {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::NoData { .. } => "no_data",
            DiagnosticKind::UnknownSeries { .. } => "unknown_series",
            DiagnosticKind::Unrecognized { .. } => "unrecognized",
            DiagnosticKind::Malformed { .. } => "malformed",
        }
    }
}

impl From<DiagnosticKind> for Diagnostic {
    fn from(kind: DiagnosticKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::NoData { series_id, year } => {
                write!(f, "No Data Available: series={series_id} year={year}")
            }
            DiagnosticKind::UnknownSeries { series_id } => {
                write!(f, "Series does not exist: series={series_id}")
            }
            DiagnosticKind::Unrecognized { raw } => write!(f, "{raw}"),
            DiagnosticKind::Malformed { series_id, detail } => {
                write!(f, "Malformed data point: series={series_id} {detail}")
            }
        }
    }
}
