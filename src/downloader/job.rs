//! Download job and run report

use crate::{Diagnostic, NormalizedRecord, SeriesKind};
use serde::{Deserialize, Serialize};

use super::config::MAX_YEAR_SPAN;

/// One run over a list of series identifiers and a year range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Series identifiers, in request order
    pub series_ids: Vec<String>,
    /// First year (inclusive)
    pub start_year: i32,
    /// Last year (inclusive)
    pub end_year: i32,
    /// National or state series; affects log labels and output names
    pub kind: SeriesKind,
}

impl DownloadJob {
    /// Job over national series
    pub fn new(series_ids: Vec<String>, start_year: i32, end_year: i32) -> Self {
        Self {
            series_ids,
            start_year,
            end_year,
            kind: SeriesKind::National,
        }
    }

    /// Set the series kind
    pub fn with_kind(mut self, kind: SeriesKind) -> Self {
        self.kind = kind;
        self
    }

    /// `end_year - start_year`, widened so extreme years cannot overflow
    pub fn year_span(&self) -> i64 {
        i64::from(self.end_year) - i64::from(self.start_year)
    }

    /// Validate the year range
    pub fn validate(&self) -> Result<(), String> {
        if self.start_year > self.end_year {
            return Err(format!(
                "Start year ({}) must not be after end year ({})",
                self.start_year, self.end_year
            ));
        }

        if self.year_span() > i64::from(MAX_YEAR_SPAN) {
            return Err(format!(
                "Year range {}-{} spans {} years (max {MAX_YEAR_SPAN})",
                self.start_year,
                self.end_year,
                self.year_span()
            ));
        }

        Ok(())
    }
}

/// Outcome of a completed pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobReport {
    /// Deduplicated records, in response order
    pub records: Vec<NormalizedRecord>,
    /// Diagnostics from every response
    pub diagnostics: Vec<Diagnostic>,
    /// Batches executed
    pub batches: usize,
    /// Records before deduplication
    pub data_points: usize,
}

impl JobReport {
    /// Records dropped as exact duplicates
    pub fn duplicates_removed(&self) -> usize {
        self.data_points.saturating_sub(self.records.len())
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} batches, {} records ({} duplicates removed), {} diagnostics",
            self.batches,
            self.records.len(),
            self.duplicates_removed(),
            self.diagnostics.len()
        )
    }
}
