//! Response normalization
//!
//! Stateless functions that flatten per-series/per-period JSON into
//! [`NormalizedRecord`]s and turn response messages into [`Diagnostic`]s.
//! Nothing here fails: a data point with unparseable fields still becomes a
//! record (with `None`/empty fields) plus a `Malformed` diagnostic.

use crate::fetcher::{ApiResponse, DataPoint};
use crate::{Diagnostic, DiagnosticKind, NormalizedRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Provider sentinel for an unavailable value
pub const MISSING_VALUE: &str = "-";

static NO_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^No Data Available for Series (\w+) Year: (\d{4})$")
        .expect("no-data pattern is a valid regex")
});

static UNKNOWN_SERIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Series does not exist for Series (\w+)$")
        .expect("unknown-series pattern is a valid regex")
});

/// Records and diagnostics produced from a set of responses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedOutput {
    /// Flattened observations, in response/series/data-point order
    pub records: Vec<NormalizedRecord>,
    /// Diagnostics, in response/message order
    pub diagnostics: Vec<Diagnostic>,
}

/// Stateless normalizer for time-series responses
pub struct BlsParser;

impl BlsParser {
    /// Flatten every data point of every series in every response, and
    /// classify every response message.
    pub fn normalize(responses: &[ApiResponse]) -> NormalizedOutput {
        let mut output = NormalizedOutput::default();

        for response in responses {
            output.diagnostics.extend(
                response
                    .messages
                    .iter()
                    .map(|message| Diagnostic::from(Self::classify_message(message))),
            );

            for series in response.series() {
                output.records.reserve(series.data_points.len());
                for point in &series.data_points {
                    let (record, malformed) = Self::parse_data_point(&series.series_id, point);
                    output.records.push(record);
                    if let Some(kind) = malformed {
                        output.diagnostics.push(kind.into());
                    }
                }
            }
        }

        output
    }

    /// Classify one response message
    pub fn classify_message(message: &str) -> DiagnosticKind {
        let trimmed = message.trim();

        if let Some(caps) = NO_DATA.captures(trimmed) {
            if let Ok(year) = caps[2].parse::<i32>() {
                return DiagnosticKind::NoData {
                    series_id: caps[1].to_string(),
                    year,
                };
            }
        }

        if let Some(caps) = UNKNOWN_SERIES.captures(trimmed) {
            return DiagnosticKind::UnknownSeries {
                series_id: caps[1].to_string(),
            };
        }

        DiagnosticKind::Unrecognized {
            raw: message.to_string(),
        }
    }

    /// Convert one data point. The second element names any fields that could
    /// not be parsed.
    pub fn parse_data_point(
        series_id: &str,
        point: &DataPoint,
    ) -> (NormalizedRecord, Option<DiagnosticKind>) {
        let mut bad_fields = Vec::new();

        if series_id.trim().is_empty() {
            bad_fields.push("seriesID");
        }

        let year = Self::parse_year(&point.year);
        if year.is_none() {
            bad_fields.push("year");
        }

        let period = Self::parse_text(&point.period).unwrap_or_else(|| {
            bad_fields.push("period");
            String::new()
        });

        let period_name = Self::parse_text(&point.period_name).unwrap_or_else(|| {
            bad_fields.push("periodName");
            String::new()
        });

        let value = match Self::parse_value(&point.value) {
            Ok(value) => value,
            Err(()) => {
                bad_fields.push("value");
                None
            }
        };

        let record = NormalizedRecord {
            series_id: series_id.trim().to_string(),
            year,
            period,
            period_name,
            value,
            footnotes: Self::parse_footnotes(&point.footnotes),
        };

        let malformed = (!bad_fields.is_empty()).then(|| DiagnosticKind::Malformed {
            series_id: record.series_id.clone(),
            detail: format!("unparseable fields: {}", bad_fields.join(", ")),
        });

        (record, malformed)
    }

    fn parse_year(raw: &Value) -> Option<i32> {
        match raw {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            _ => None,
        }
    }

    fn parse_text(raw: &Value) -> Option<String> {
        match raw {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `Ok(None)` for the missing-value sentinel, `Err` for anything unparseable
    fn parse_value(raw: &Value) -> Result<Option<f64>, ()> {
        match raw {
            Value::String(s) => {
                let s = s.trim();
                if s == MISSING_VALUE {
                    Ok(None)
                } else {
                    s.parse::<f64>().map(Some).map_err(|_| ())
                }
            }
            Value::Number(n) => n.as_f64().map(Some).ok_or(()),
            _ => Err(()),
        }
    }

    /// Compact JSON of the footnotes as received; `None` when every entry is
    /// empty (`[{}]`, `[]`, null)
    fn parse_footnotes(raw: &Value) -> Option<String> {
        match raw {
            Value::Null => None,
            Value::Array(items) if items.iter().all(is_empty_footnote) => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            other if is_empty_footnote(other) => None,
            other => serde_json::to_string(other).ok(),
        }
    }
}

fn is_empty_footnote(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.values().all(Value::is_null),
        _ => false,
    }
}

/// Shorthand for [`BlsParser::normalize`]
pub fn normalize(responses: &[ApiResponse]) -> NormalizedOutput {
    BlsParser::normalize(responses)
}
