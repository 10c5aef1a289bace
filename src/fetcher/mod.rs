//! Wire types and the transport seam for the time-series endpoint

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub mod bls_http;
pub mod bls_parser;
pub mod retry_formatter;

pub use bls_http::BlsHttpClient;
pub use bls_parser::{normalize, BlsParser, NormalizedOutput};

/// Status string the provider returns on success
pub const STATUS_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

/// Transport errors, before retry classification
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Non-200 HTTP status
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Connection, DNS or timeout failure with no HTTP status
    #[error("network error: {0}")]
    Network(String),

    /// 200 response whose body is not the expected JSON shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Request body for the time-series endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeriesRequest {
    /// Series identifiers
    #[serde(rename = "seriesid")]
    pub series_ids: Vec<String>,
    /// First year, as a string
    #[serde(rename = "startyear")]
    pub start_year: String,
    /// Last year, as a string
    #[serde(rename = "endyear")]
    pub end_year: String,
    /// Opaque registration token
    #[serde(rename = "registrationKey", skip_serializing_if = "Option::is_none")]
    pub registration_key: Option<String>,
}

impl SeriesRequest {
    /// Build a request body
    pub fn new(
        series_ids: Vec<String>,
        start_year: i32,
        end_year: i32,
        registration_key: Option<String>,
    ) -> Self {
        Self {
            series_ids,
            start_year: start_year.to_string(),
            end_year: end_year.to_string(),
            registration_key,
        }
    }
}

/// Payload-level status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseStatus {
    /// `REQUEST_SUCCEEDED`
    Succeeded,
    /// Anything else (e.g., `REQUEST_NOT_PROCESSED`)
    Other(String),
}

impl ResponseStatus {
    /// Raw status string
    pub fn as_str(&self) -> &str {
        match self {
            ResponseStatus::Succeeded => STATUS_SUCCEEDED,
            ResponseStatus::Other(status) => status,
        }
    }
}

impl From<String> for ResponseStatus {
    fn from(status: String) -> Self {
        if status == STATUS_SUCCEEDED {
            ResponseStatus::Succeeded
        } else {
            ResponseStatus::Other(status)
        }
    }
}

impl From<ResponseStatus> for String {
    fn from(status: ResponseStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Payload status
    pub status: ResponseStatus,
    /// Server-side processing time in milliseconds
    #[serde(rename = "responseTime", default)]
    pub response_time: Option<i64>,
    /// Partial-failure and informational messages
    #[serde(rename = "message", default, deserialize_with = "lenient_messages")]
    pub messages: Vec<String>,
    /// Per-series results
    #[serde(rename = "Results", default, deserialize_with = "null_as_default")]
    pub results: ApiResults,
}

impl ApiResponse {
    /// Per-series results
    pub fn series(&self) -> &[SeriesResult] {
        &self.results.series
    }

    /// Whether the payload status is success
    pub fn is_succeeded(&self) -> bool {
        self.status == ResponseStatus::Succeeded
    }
}

/// `Results` object of a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResults {
    /// Series returned
    #[serde(default, deserialize_with = "lenient_series")]
    pub series: Vec<SeriesResult>,
}

/// Data for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    /// Series identifier
    #[serde(rename = "seriesID", default, deserialize_with = "lenient_text")]
    pub series_id: String,
    /// Observations. A row that is not an object decodes as an empty point.
    #[serde(rename = "data", default, deserialize_with = "lenient_points")]
    pub data_points: Vec<DataPoint>,
}

/// One observation, kept as raw JSON so a malformed field never fails the batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Year, usually a string such as "2005"
    #[serde(default)]
    pub year: Value,
    /// Period code
    #[serde(default)]
    pub period: Value,
    /// Period name
    #[serde(rename = "periodName", default)]
    pub period_name: Value,
    /// Value string, or "-" when unavailable
    #[serde(default)]
    pub value: Value,
    /// Footnote objects, `[{}]` when there are none
    #[serde(default)]
    pub footnotes: Value,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Elements of a JSON array; a lone non-array value counts as one element
fn raw_items<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_messages<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_items(deserializer)?.into_iter().filter_map(text_of).collect())
}

fn lenient_series<'de, D>(deserializer: D) -> Result<Vec<SeriesResult>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_items(deserializer)?
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn lenient_points<'de, D>(deserializer: D) -> Result<Vec<DataPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(raw_items(deserializer)?
        .into_iter()
        .map(|item| match item {
            Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
            _ => DataPoint::default(),
        })
        .collect())
}

/// Sends one request body and returns the decoded response.
///
/// Implementations report non-200 statuses as [`TransportError::Status`] and
/// leave payload-status interpretation to the caller.
#[async_trait]
pub trait SeriesTransport: Send + Sync {
    /// POST the request body to the endpoint
    async fn post_series(&self, request: &SeriesRequest) -> Result<ApiResponse, TransportError>;

    /// Endpoint URL, for log context
    fn endpoint(&self) -> &str;
}
