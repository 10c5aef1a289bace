//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bls_data_downloader::fetcher::{
    ApiResponse, ApiResults, DataPoint, ResponseStatus, SeriesRequest, SeriesResult,
    SeriesTransport, TransportError,
};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Transport that replays scripted results, then echoes successful
/// responses once the script runs out.
#[derive(Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<SeriesRequest>>,
    duplicate_first_point: bool,
}

impl FakeTransport {
    pub fn scripted(script: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn echo() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Echo transport that repeats the first data point of every response
    pub fn echo_with_duplicates() -> Arc<Self> {
        Arc::new(Self {
            duplicate_first_point: true,
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<SeriesRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn echo_response(&self, request: &SeriesRequest) -> ApiResponse {
        let start: i32 = request.start_year.parse().unwrap();
        let end: i32 = request.end_year.parse().unwrap();

        let mut series: Vec<SeriesResult> = request
            .series_ids
            .iter()
            .map(|id| SeriesResult {
                series_id: id.clone(),
                data_points: (start..=end)
                    .map(|year| data_point(year, "M01", "January", "3.5"))
                    .collect(),
            })
            .collect();

        if self.duplicate_first_point {
            if let Some(first) = series.first_mut() {
                let copy = first.data_points[0].clone();
                first.data_points.push(copy);
            }
        }

        success(series, vec![])
    }
}

#[async_trait]
impl SeriesTransport for FakeTransport {
    async fn post_series(&self, request: &SeriesRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(self.echo_response(request)),
        }
    }

    fn endpoint(&self) -> &str {
        "fake://bls"
    }
}

pub fn data_point(year: i32, period: &str, period_name: &str, value: &str) -> DataPoint {
    DataPoint {
        year: json!(year.to_string()),
        period: json!(period),
        period_name: json!(period_name),
        value: json!(value),
        footnotes: json!([{}]),
    }
}

pub fn success(series: Vec<SeriesResult>, messages: Vec<&str>) -> ApiResponse {
    ApiResponse {
        status: ResponseStatus::Succeeded,
        response_time: Some(12),
        messages: messages.into_iter().map(String::from).collect(),
        results: ApiResults { series },
    }
}

pub fn http_status(status: u16) -> Result<ApiResponse, TransportError> {
    Err(TransportError::Status {
        status,
        body: String::new(),
    })
}

pub fn series_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("LNS{:08}", i)).collect()
}

/// Counts events by level for one target prefix
#[derive(Clone)]
pub struct EventCounter {
    target: &'static str,
    counts: Arc<Mutex<HashMap<Level, usize>>>,
}

impl EventCounter {
    pub fn for_target(target: &'static str) -> Self {
        Self {
            target,
            counts: Arc::default(),
        }
    }

    pub fn count(&self, level: Level) -> usize {
        self.counts
            .lock()
            .unwrap()
            .get(&level)
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }
}

impl<S: Subscriber> Layer<S> for EventCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(self.target) {
            *self
                .counts
                .lock()
                .unwrap()
                .entry(*metadata.level())
                .or_default() += 1;
        }
    }
}
