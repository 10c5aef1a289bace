//! Validation subcommand and year-range checks

use super::CliError;
use crate::downloader::config::{DAILY_QUERY_LIMIT, MAX_YEAR_SPAN};
use crate::input::read_series_csv;
use crate::quota::{FileQuotaStore, QuotaStore};
use crate::SeriesKind;
use chrono::Datelike;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Check a requested year range before any quota is spent.
///
/// Both years must be positive, `end_year` must not be after `current_year`,
/// `start_year <= end_year`, and the span must not exceed the provider limit.
pub fn validate_years(start_year: i32, end_year: i32, current_year: i32) -> Result<(), CliError> {
    if start_year <= 0 || end_year <= 0 {
        return Err(CliError::InvalidArgument(format!(
            "Years must be positive (got {start_year}-{end_year})"
        )));
    }
    if end_year > current_year {
        return Err(CliError::InvalidArgument(format!(
            "End year {end_year} is in the future (current year {current_year})"
        )));
    }
    if start_year > end_year {
        return Err(CliError::InvalidArgument(format!(
            "Start year {start_year} is after end year {end_year}"
        )));
    }
    if end_year - start_year > MAX_YEAR_SPAN {
        return Err(CliError::InvalidArgument(format!(
            "Year range {start_year}-{end_year} exceeds {MAX_YEAR_SPAN} years"
        )));
    }
    Ok(())
}

/// Validate command
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// What to validate
    #[command(subcommand)]
    pub target: ValidateTarget,
}

/// Target type for validation
#[derive(clap::Subcommand, Debug)]
pub enum ValidateTarget {
    /// Check a year range against the provider limits
    Years {
        /// First year (inclusive)
        #[arg(long)]
        start_year: i32,
        /// Last year (inclusive)
        #[arg(long)]
        end_year: i32,
    },
    /// Parse a series list CSV
    Input {
        /// Series list CSV
        path: PathBuf,
        /// national or state
        #[arg(long, default_value = "national")]
        series_type: SeriesKind,
    },
    /// Show today's quota usage
    Quota,
}

impl ValidateCommand {
    /// Execute the validation command
    pub async fn execute(&self, quota_file: &Path) -> Result<(), CliError> {
        match &self.target {
            ValidateTarget::Years {
                start_year,
                end_year,
            } => {
                validate_years(*start_year, *end_year, chrono::Local::now().year())?;
                println!("Valid year range: {start_year}-{end_year}");
                Ok(())
            }
            ValidateTarget::Input { path, series_type } => {
                let series = read_series_csv(path, *series_type, None)?;
                println!("Valid {} series list: {} series", series_type, series.len());
                Ok(())
            }
            ValidateTarget::Quota => Self::show_quota(quota_file),
        }
    }

    fn show_quota(quota_file: &Path) -> Result<(), CliError> {
        let store = FileQuotaStore::new(quota_file);
        let today = chrono::Local::now().day();

        let calls_today = match store.read()? {
            Some(state) if state.day_of_month == today => state.calls_today,
            _ => 0,
        };

        println!("Quota file: {}", quota_file.display());
        println!(
            "  Calls today: {calls_today}/{DAILY_QUERY_LIMIT} ({} remaining)",
            DAILY_QUERY_LIMIT.saturating_sub(calls_today)
        );
        Ok(())
    }
}
