//! Post-processing over normalized data: exact-duplicate removal and
//! seasonal-adjustment tagging of series names.

use crate::{NormalizedRecord, SeriesMetadata};
use std::collections::HashSet;

const SEASONALLY_ADJUSTED: &str = ", seasonally adjusted";
const NOT_SEASONALLY_ADJUSTED: &str = ", not seasonally adjusted";

/// Structural identity of a record; values compare by bit pattern
type RecordFingerprint<'a> = (
    &'a str,
    Option<i32>,
    &'a str,
    &'a str,
    Option<u64>,
    Option<&'a str>,
);

fn fingerprint(record: &NormalizedRecord) -> RecordFingerprint<'_> {
    (
        &record.series_id,
        record.year,
        &record.period,
        &record.period_name,
        record.value.map(f64::to_bits),
        record.footnotes.as_deref(),
    )
}

/// Drop records identical to an earlier one, keeping first occurrences in order
pub fn dedupe(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(records.len());
        records
            .iter()
            .map(|record| seen.insert(fingerprint(record)))
            .collect()
    };

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}

/// Strip a trailing adjustment suffix (ASCII case-insensitive) from `name`.
///
/// Returns the cleaned name and `Some(true)` / `Some(false)` for seasonally /
/// not seasonally adjusted; names without a suffix come back trimmed with `None`.
pub fn split_adjustment(name: &str) -> (String, Option<bool>) {
    let trimmed = name.trim();

    for (suffix, adjusted) in [(NOT_SEASONALLY_ADJUSTED, false), (SEASONALLY_ADJUSTED, true)] {
        if let Some(stem) = strip_suffix_ignore_case(trimmed, suffix) {
            return (stem.trim_end().to_string(), Some(adjusted));
        }
    }

    (trimmed.to_string(), None)
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Tag every series with its adjustment flag and clean its name.
///
/// The input is left untouched.
pub fn tag_adjustment(series: &[SeriesMetadata]) -> Vec<SeriesMetadata> {
    series
        .iter()
        .map(|meta| {
            let (series_name, is_adjusted) = split_adjustment(&meta.series_name);
            SeriesMetadata {
                series_name,
                is_adjusted,
                ..meta.clone()
            }
        })
        .collect()
}
