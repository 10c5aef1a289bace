//! Series metadata input
//!
//! Reads the series lists prepared by the catalog step: one row per series
//! with headers `seriesID`, `series`, `survey` and, for state lists, `state`.

use crate::{SeriesKind, SeriesMetadata};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Series input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File could not be opened
    #[error("IO error: {0}")]
    IoError(String),

    /// Row could not be parsed
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Row without a series identifier (1-based data row)
    #[error("row {row}: missing seriesID")]
    MissingSeriesId {
        /// Data row number
        row: usize,
    },

    /// State list row without a state name
    #[error("row {row}: state series {series_id} has no state")]
    MissingState {
        /// Data row number
        row: usize,
        /// Series on that row
        series_id: String,
    },
}

#[derive(Debug, Deserialize)]
struct SeriesRow {
    #[serde(rename = "seriesID", default)]
    series_id: String,
    #[serde(default)]
    series: String,
    #[serde(default)]
    survey: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Read up to `limit` series rows (all rows when `None`).
///
/// Fields are whitespace-trimmed. State lists must name a state on every row.
pub fn read_series_csv(
    path: impl AsRef<Path>,
    kind: SeriesKind,
    limit: Option<usize>,
) -> Result<Vec<SeriesMetadata>, InputError> {
    let path = path.as_ref();
    debug!("Reading {} series list: path={}", kind, path.display());

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| InputError::IoError(format!("Failed to open {}: {e}", path.display())))?;

    let mut series = Vec::new();
    for (index, row) in reader
        .deserialize::<SeriesRow>()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
    {
        let row_number = index + 1;
        let row = row.map_err(|e| InputError::CsvError(format!("row {row_number}: {e}")))?;

        if row.series_id.is_empty() {
            return Err(InputError::MissingSeriesId { row: row_number });
        }

        let state = non_empty(row.state);
        if kind == SeriesKind::State && state.is_none() {
            return Err(InputError::MissingState {
                row: row_number,
                series_id: row.series_id,
            });
        }

        series.push(SeriesMetadata {
            series_id: row.series_id,
            series_name: row.series,
            is_adjusted: None,
            survey_code: non_empty(row.survey),
            state,
        });
    }

    info!("Loaded {} {} series from {}", series.len(), kind, path.display());
    Ok(series)
}

/// Series identifiers, in input order
pub fn series_ids(series: &[SeriesMetadata]) -> Vec<String> {
    series.iter().map(|meta| meta.series_id.clone()).collect()
}
