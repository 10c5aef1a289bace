//! Data output writers
//!
//! The writer traits are the hand-off point to the destination store; the
//! CSV implementations here produce the files a loader upserts from.

use crate::{NormalizedRecord, SeriesKind, SeriesMetadata};
use std::path::{Path, PathBuf};

pub mod csv;

pub use self::csv::{CsvRecordsWriter, CsvSeriesWriter};

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Sink for normalized observations
pub trait RecordsWriter: OutputWriter {
    /// Write one record
    fn write_record(&mut self, record: &NormalizedRecord) -> OutputResult<()>;

    /// Write records in order
    fn write_records(&mut self, records: &[NormalizedRecord]) -> OutputResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }
}

/// Sink for series metadata
pub trait SeriesWriter: OutputWriter {
    /// Write one series row
    fn write_series(&mut self, series: &SeriesMetadata) -> OutputResult<()>;

    /// Write series rows in order
    fn write_all_series(&mut self, series: &[SeriesMetadata]) -> OutputResult<()> {
        for meta in series {
            self.write_series(meta)?;
        }
        Ok(())
    }
}

/// File names for one run's outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    dir: PathBuf,
    kind: SeriesKind,
}

impl OutputPaths {
    /// Outputs for `kind` under `dir`
    pub fn new(dir: impl Into<PathBuf>, kind: SeriesKind) -> Self {
        Self {
            dir: dir.into(),
            kind,
        }
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{prefix}_series.csv`
    pub fn series(&self) -> PathBuf {
        self.dir
            .join(format!("{}_series.csv", self.kind.file_prefix()))
    }

    /// `{prefix}_results.csv`
    pub fn results(&self) -> PathBuf {
        self.dir
            .join(format!("{}_results.csv", self.kind.file_prefix()))
    }
}
