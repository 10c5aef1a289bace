//! Batch planning

use super::config::MAX_SERIES_PER_REQUEST;

/// Ordered group of series identifiers sent in one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesBatch {
    /// Position of this batch in the plan (0-based)
    pub index: usize,
    /// Series identifiers, in input order
    pub series_ids: Vec<String>,
}

impl SeriesBatch {
    /// Batch over the given identifiers
    pub fn new(index: usize, series_ids: Vec<String>) -> Self {
        Self { index, series_ids }
    }

    /// Number of identifiers in the batch
    pub fn len(&self) -> usize {
        self.series_ids.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.series_ids.is_empty()
    }
}

/// Lazy sequence of batches over a borrowed identifier list
#[derive(Debug, Clone)]
pub struct BatchPlan<'a> {
    chunks: std::iter::Enumerate<std::slice::Chunks<'a, String>>,
    total: usize,
}

impl<'a> BatchPlan<'a> {
    /// Number of batches the plan yields in total
    pub fn batch_count(&self) -> usize {
        self.total
    }
}

impl Iterator for BatchPlan<'_> {
    type Item = SeriesBatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks
            .next()
            .map(|(index, chunk)| SeriesBatch::new(index, chunk.to_vec()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for BatchPlan<'_> {}

/// Split `ids` into batches of at most `max_batch`, preserving order.
///
/// Yields `ceil(len / max_batch)` batches; only the last may be short. A
/// `max_batch` of zero is treated as one.
pub fn plan(ids: &[String], max_batch: usize) -> BatchPlan<'_> {
    let max_batch = max_batch.max(1);
    BatchPlan {
        chunks: ids.chunks(max_batch).enumerate(),
        total: ids.len().div_ceil(max_batch),
    }
}

/// [`plan`] with the provider's per-request limit
pub fn plan_default(ids: &[String]) -> BatchPlan<'_> {
    plan(ids, MAX_SERIES_PER_REQUEST)
}
