//! Sequential download pipeline
//!
//! plan → execute each batch in order → pause → normalize → dedupe.
//! The first batch error aborts the run; responses already received are
//! discarded with it.

use super::batch::plan;
use super::config::{ClientConfig, MAX_SERIES_PER_REQUEST};
use super::executor::RequestExecutor;
use super::job::{DownloadJob, JobReport};
use super::progress::BatchProgress;
use super::{ApiError, DownloadError};
use crate::fetcher::{normalize, ApiResponse, BlsHttpClient};
use crate::metrics::{record_batch_completed, record_diagnostic};
use crate::quota::{FileQuotaStore, QuotaLedger};
use crate::transform::dedupe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Instrument};

/// Runs download jobs batch by batch over one executor
pub struct SeriesPipeline {
    executor: RequestExecutor,
    batch_size: usize,
    inter_batch_pause: Duration,
    show_progress: bool,
}

impl SeriesPipeline {
    /// Pipeline over an executor with the provider's batch size and pause
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            batch_size: MAX_SERIES_PER_REQUEST,
            inter_batch_pause: ClientConfig::default().inter_batch_pause,
            show_progress: false,
        }
    }

    /// Production pipeline: HTTP transport plus file-backed quota ledger
    pub fn from_config(config: &ClientConfig) -> Result<Self, DownloadError> {
        let transport = BlsHttpClient::with_timeout(&config.endpoint, config.request_timeout)
            .map_err(|e| DownloadError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let ledger = QuotaLedger::new(FileQuotaStore::new(&config.quota_file))
            .with_daily_limit(config.daily_limit);

        let executor = RequestExecutor::new(Arc::new(transport), Arc::new(ledger))
            .with_registration_key(config.registration_key.clone())
            .with_max_attempts(config.max_attempts);

        Ok(Self::new(executor).with_inter_batch_pause(config.inter_batch_pause))
    }

    /// Pause after each successful batch that is followed by another
    pub fn with_inter_batch_pause(mut self, pause: Duration) -> Self {
        self.inter_batch_pause = pause;
        self
    }

    /// Identifiers per batch, capped at the provider limit
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_SERIES_PER_REQUEST);
        self
    }

    /// Draw a terminal progress bar while fetching
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Executor used for every batch
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Fetch, normalize and deduplicate every series of `job`
    pub async fn run(&self, job: &DownloadJob) -> Result<JobReport, DownloadError> {
        let span = tracing::info_span!(
            "series_download",
            kind = %job.kind,
            series = job.series_ids.len(),
            start_year = job.start_year,
            end_year = job.end_year
        );

        self.run_inner(job).instrument(span).await
    }

    async fn run_inner(&self, job: &DownloadJob) -> Result<JobReport, DownloadError> {
        let responses = self.fetch(job).await?;

        let output = normalize(&responses);
        let data_points = output.records.len();
        let records = dedupe(output.records);

        for diagnostic in &output.diagnostics {
            record_diagnostic(diagnostic.kind.label());
            warn!(diagnostic = diagnostic.kind.label(), "{}", diagnostic);
        }

        let report = JobReport {
            records,
            diagnostics: output.diagnostics,
            batches: responses.len(),
            data_points,
        };
        info!("{} download complete: {}", job.kind, report.summary());
        Ok(report)
    }

    /// Execute every batch of `job` in order and collect the raw responses
    pub async fn fetch(&self, job: &DownloadJob) -> Result<Vec<ApiResponse>, ApiError> {
        job.validate().map_err(ApiError::InvalidArgument)?;
        if job.series_ids.is_empty() {
            info!("No {} series to download", job.kind);
            return Ok(Vec::new());
        }

        let batches = plan(&job.series_ids, self.batch_size);
        let total = batches.batch_count();
        let mut progress = BatchProgress::new(job.kind, total, job.series_ids.len());
        if self.show_progress {
            progress = progress.with_bar();
        }

        info!(
            "Downloading {} {} series in {} batches",
            job.series_ids.len(),
            job.kind,
            total
        );

        let mut responses = Vec::with_capacity(total);
        for batch in batches {
            if batch.index > 0 {
                tokio::time::sleep(self.inter_batch_pause).await;
            }

            progress.start_batch(&batch);
            let size = batch.len();
            let response = self
                .executor
                .execute(batch, job.start_year, job.end_year)
                .await?;
            record_batch_completed();
            progress.finish_batch(size);
            responses.push(response);
        }
        progress.finish();

        Ok(responses)
    }
}
