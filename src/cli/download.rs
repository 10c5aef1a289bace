//! Download command implementation

use crate::downloader::config::{DEFAULT_ENDPOINT, DEFAULT_QUOTA_FILE};
use crate::downloader::{ClientConfig, DownloadJob, JobReport, SeriesPipeline};
use crate::input::{read_series_csv, series_ids};
use crate::output::{
    CsvRecordsWriter, CsvSeriesWriter, OutputPaths, OutputWriter, RecordsWriter, SeriesWriter,
};
use crate::transform::tag_adjustment;
use crate::{SeriesKind, SeriesMetadata};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

use super::validate::validate_years;
use super::CliError;

/// BLS Data Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "bls-data-downloader")]
#[command(about = "Download BLS time series within the public API limits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true, default_value_t = false, conflicts_with = "silence")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, default_value_t = false)]
    pub silence: bool,

    /// Daily quota log
    #[arg(long, global = true, default_value = DEFAULT_QUOTA_FILE)]
    pub quota_file: PathBuf,

    /// Serve Prometheus metrics on this address (e.g., 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download series data and write CSV outputs
    Download(DownloadArgs),

    /// Validate inputs, year ranges or quota state
    Validate(super::ValidateCommand),
}

/// Download command arguments
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Series list CSV (seriesID, series, survey[, state])
    #[arg(long)]
    pub input: PathBuf,

    /// national or state
    #[arg(long, default_value = "national")]
    pub series_type: SeriesKind,

    /// First year (inclusive)
    #[arg(long)]
    pub start_year: i32,

    /// Last year (inclusive)
    #[arg(long)]
    pub end_year: i32,

    /// Only query the first N series of the list
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u64).range(1..))]
    pub series_count: Option<u64>,

    /// API registration key
    #[arg(long, env = "BLS_REGISTRATION_KEY", hide_env_values = true)]
    pub registration_key: Option<String>,

    /// Directory for the series and results CSVs
    #[arg(long, default_value = "outputs/excel_op")]
    pub output_dir: PathBuf,

    /// API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Attempts per batch (1-10)
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: u32,

    /// Show a progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

impl DownloadArgs {
    /// Client configuration for these arguments
    pub fn client_config(&self, cli: &Cli) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_endpoint(&self.endpoint)
            .with_quota_file(&cli.quota_file)
            .with_max_attempts(self.max_attempts);
        if let Some(key) = &self.registration_key {
            config = config.with_registration_key(key);
        }
        config
    }

    /// Execute the download command
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        validate_years(self.start_year, self.end_year, chrono::Local::now().year())?;

        let limit = self
            .series_count
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        let series = read_series_csv(&self.input, self.series_type, limit)?;

        if self.registration_key.is_none() {
            warn!("No registration key configured; the API applies unregistered limits");
        }

        if let Some(addr) = cli.metrics_addr {
            crate::metrics::init_metrics(addr).map_err(|e| {
                CliError::ConfigurationError(format!("Failed to start metrics exporter: {e}"))
            })?;
        }

        let pipeline = SeriesPipeline::from_config(&self.client_config(cli))?
            .with_progress(self.progress);

        let job = DownloadJob::new(series_ids(&series), self.start_year, self.end_year)
            .with_kind(self.series_type);

        info!(
            "Starting {} download: {} series, {}-{}",
            self.series_type,
            job.series_ids.len(),
            self.start_year,
            self.end_year
        );

        let report = pipeline.run(&job).await?;
        let paths = OutputPaths::new(&self.output_dir, self.series_type);
        write_outputs(&paths, &tag_adjustment(&series), &report)?;

        println!(
            "{} series: {} -> {}, {}",
            self.series_type,
            series.len(),
            paths.results().display(),
            report.summary()
        );
        Ok(())
    }
}

/// Write the tagged series list and the downloaded records
pub fn write_outputs(
    paths: &OutputPaths,
    series: &[SeriesMetadata],
    report: &JobReport,
) -> Result<(), CliError> {
    let mut series_writer = CsvSeriesWriter::new(paths.series())?;
    series_writer.write_all_series(series)?;
    series_writer.close()?;

    let mut records_writer = CsvRecordsWriter::new(paths.results())?;
    records_writer.write_records(&report.records)?;
    records_writer.close()?;

    info!(
        "Wrote {} series and {} records to {}",
        series.len(),
        report.records.len(),
        paths.dir().display()
    );
    Ok(())
}
