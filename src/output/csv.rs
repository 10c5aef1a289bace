//! CSV output writers

use crate::{NormalizedRecord, SeriesMetadata};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, RecordsWriter, SeriesWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192;
const FLUSH_EVERY: u64 = 1000;

/// CSV row for one observation
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    #[serde(rename = "seriesID")]
    series_id: &'a str,
    year: Option<i32>,
    period: &'a str,
    period_name: &'a str,
    value: Option<f64>,
    footnotes: Option<&'a str>,
}

impl<'a> From<&'a NormalizedRecord> for ResultRow<'a> {
    fn from(record: &'a NormalizedRecord) -> Self {
        Self {
            series_id: &record.series_id,
            year: record.year,
            period: &record.period,
            period_name: &record.period_name,
            value: record.value,
            footnotes: record.footnotes.as_deref(),
        }
    }
}

/// CSV row for one series
#[derive(Debug, Serialize)]
struct SeriesRow<'a> {
    #[serde(rename = "seriesID")]
    series_id: &'a str,
    series: &'a str,
    state: Option<&'a str>,
    survey: Option<&'a str>,
    is_adjusted: Option<bool>,
}

impl<'a> From<&'a SeriesMetadata> for SeriesRow<'a> {
    fn from(meta: &'a SeriesMetadata) -> Self {
        Self {
            series_id: &meta.series_id,
            series: &meta.series_name,
            state: meta.state.as_deref(),
            survey: meta.survey_code.as_deref(),
            is_adjusted: meta.is_adjusted,
        }
    }
}

/// Buffered CSV file shared by both writers
struct CsvFile {
    writer: Writer<BufWriter<File>>,
    rows_written: u64,
}

impl CsvFile {
    fn create(path: &Path, buffer_size: usize) -> OutputResult<Self> {
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;

        Ok(Self {
            writer: Writer::from_writer(BufWriter::with_capacity(buffer_size, file)),
            rows_written: 0,
        })
    }

    fn write<T: Serialize>(&mut self, row: &T) -> OutputResult<()> {
        self.writer
            .serialize(row)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {e}")))?;

        self.rows_written += 1;
        if self.rows_written % FLUSH_EVERY == 0 {
            self.flush()?;
            debug!("Progress: {} rows written", self.rows_written);
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<u64> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        Ok(self.rows_written)
    }
}

/// CSV writer for normalized records
///
/// Columns: `seriesID,year,period,period_name,value,footnotes`. Missing
/// values and footnotes are written as empty fields.
pub struct CsvRecordsWriter {
    file: CsvFile,
}

impl CsvRecordsWriter {
    /// Create (or truncate) the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Ok(Self {
            file: CsvFile::create(path.as_ref(), DEFAULT_BUFFER_SIZE)?,
        })
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.file.rows_written
    }
}

impl RecordsWriter for CsvRecordsWriter {
    fn write_record(&mut self, record: &NormalizedRecord) -> OutputResult<()> {
        self.file.write(&ResultRow::from(record))
    }
}

impl OutputWriter for CsvRecordsWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.file.flush()
    }

    fn close(self) -> OutputResult<()> {
        let written = self.file.close()?;
        info!("CSV writer closed successfully: {} records written", written);
        Ok(())
    }
}

/// CSV writer for series metadata
///
/// Columns: `seriesID,series,state,survey,is_adjusted`.
pub struct CsvSeriesWriter {
    file: CsvFile,
}

impl CsvSeriesWriter {
    /// Create (or truncate) the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Ok(Self {
            file: CsvFile::create(path.as_ref(), DEFAULT_BUFFER_SIZE)?,
        })
    }

    /// Series written so far
    pub fn series_written(&self) -> u64 {
        self.file.rows_written
    }
}

impl SeriesWriter for CsvSeriesWriter {
    fn write_series(&mut self, series: &SeriesMetadata) -> OutputResult<()> {
        self.file.write(&SeriesRow::from(series))
    }
}

impl OutputWriter for CsvSeriesWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.file.flush()
    }

    fn close(self) -> OutputResult<()> {
        let written = self.file.close()?;
        info!("CSV writer closed successfully: {} series written", written);
        Ok(())
    }
}
