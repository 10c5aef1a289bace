//! HTTP transport for the time-series endpoint
//!
//! One POST per call, no retries here: retry and quota policy live in
//! [`crate::downloader::RequestExecutor`] so every attempt is metered.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{ApiResponse, SeriesRequest, SeriesTransport, TransportError};
use crate::metrics::HttpRequestMetrics;

/// Longest error body kept in [`TransportError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// reqwest-backed [`SeriesTransport`]
#[derive(Clone)]
pub struct BlsHttpClient {
    client: Arc<Client>,
    endpoint: String,
}

impl BlsHttpClient {
    /// Transport posting to `endpoint` through a shared client
    pub fn new(client: Arc<Client>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Transport with its own client and request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new(Arc::new(client), endpoint))
    }
}

/// Parse a 200 body; only a JSON shape failure is a decode error
pub fn decode_body(body: &[u8]) -> Result<ApiResponse, TransportError> {
    serde_json::from_slice(body).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl SeriesTransport for BlsHttpClient {
    async fn post_series(&self, request: &SeriesRequest) -> Result<ApiResponse, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            series = request.series_ids.len(),
            start_year = %request.start_year,
            end_year = %request.end_year,
            "Posting series request"
        );

        let metrics = HttpRequestMetrics::start(&self.endpoint);

        let response = match self.client.post(&self.endpoint).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics.record_network_error();
                return Err(TransportError::Network(e.to_string()));
            }
        };

        let status = response.status();
        metrics.record_complete(status.as_u16());

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return Err(TransportError::Network(format!("failed to read body: {e}"))),
        };
        decode_body(&body)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
