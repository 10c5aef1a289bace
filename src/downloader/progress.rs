//! Batch progress reporting.
//!
//! Logs one line when a batch starts and one when it completes, with the
//! running series count and percentage. An optional terminal progress bar
//! mirrors the same counts.

use super::batch::SeriesBatch;
use crate::SeriesKind;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Progress over the batches of one job
#[derive(Debug)]
pub struct BatchProgress {
    kind: SeriesKind,
    total_batches: usize,
    total_series: usize,
    series_done: usize,
    batches_done: usize,
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    /// Tracker for `total_batches` covering `total_series` identifiers
    pub fn new(kind: SeriesKind, total_batches: usize, total_series: usize) -> Self {
        Self {
            kind,
            total_batches,
            total_series,
            series_done: 0,
            batches_done: 0,
            bar: None,
        }
    }

    /// Also draw a terminal progress bar
    pub fn with_bar(mut self) -> Self {
        let bar = ProgressBar::new(self.total_series as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("hardcoded template is valid")
                .progress_chars("#>-"),
        );
        bar.set_message(format!("Downloading {} series", self.kind));
        self.bar = Some(bar);
        self
    }

    /// Log the start of a batch
    pub fn start_batch(&self, batch: &SeriesBatch) {
        info!(
            kind = %self.kind,
            batch = batch.index + 1,
            total_batches = self.total_batches,
            "Processing {} batch {}/{} of size {}",
            self.kind,
            batch.index + 1,
            self.total_batches,
            batch.len()
        );
    }

    /// Count a completed batch of `size` identifiers
    pub fn finish_batch(&mut self, size: usize) {
        self.batches_done += 1;
        self.series_done = (self.series_done + size).min(self.total_series);
        if let Some(bar) = &self.bar {
            bar.inc(size as u64);
        }
        info!(
            kind = %self.kind,
            series_done = self.series_done,
            total_series = self.total_series,
            "Progress: {}/{} series ({:.1}%)",
            self.series_done,
            self.total_series,
            self.percentage()
        );
    }

    /// Close the progress bar, if any
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(format!(
                "Downloaded {} {} series",
                self.series_done, self.kind
            ));
        }
    }

    /// Completion percentage (0-100); an empty job is complete
    pub fn percentage(&self) -> f64 {
        if self.total_series == 0 {
            return 100.0;
        }
        self.series_done as f64 / self.total_series as f64 * 100.0
    }

    /// Batches completed so far
    pub fn batches_done(&self) -> usize {
        self.batches_done
    }
}
