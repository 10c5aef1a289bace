//! Provider limits, retry policy and client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Public data API v2 endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";

/// Maximum series identifiers per request.
pub const MAX_SERIES_PER_REQUEST: usize = 50;

/// Maximum `end_year - start_year` per request.
pub const MAX_YEAR_SPAN: i32 = 20;

/// Calls allowed per day for a registered key.
pub const DAILY_QUERY_LIMIT: u32 = 500;

/// Attempts per batch (initial try included).
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause after every successful batch.
pub const INTER_BATCH_PAUSE: Duration = Duration::from_millis(250);

/// HTTP request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default location of the quota log
pub const DEFAULT_QUOTA_FILE: &str = "outputs/runtime_output/query_count.txt";

/// Backoff after failed attempt `attempt` (1-based): `2^attempt` seconds
pub fn calculate_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Client configuration
///
/// Defaults match the provider's published limits; only the registration key
/// has no default.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Registration key sent with every request
    pub registration_key: Option<String>,
    /// Attempts per batch
    pub max_attempts: u32,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Pause after every successful batch
    pub inter_batch_pause: Duration,
    /// Daily call limit enforced by the ledger
    pub daily_limit: u32,
    /// Quota log path
    pub quota_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            registration_key: None,
            max_attempts: MAX_ATTEMPTS,
            request_timeout: REQUEST_TIMEOUT,
            inter_batch_pause: INTER_BATCH_PAUSE,
            daily_limit: DAILY_QUERY_LIMIT,
            quota_file: PathBuf::from(DEFAULT_QUOTA_FILE),
        }
    }
}

impl ClientConfig {
    /// Set the registration key
    pub fn with_registration_key(mut self, key: impl Into<String>) -> Self {
        self.registration_key = Some(key.into());
        self
    }

    /// Set the endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set attempts per batch
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the quota log path
    pub fn with_quota_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.quota_file = path.into();
        self
    }

    /// Set the pause after successful batches
    pub fn with_inter_batch_pause(mut self, pause: Duration) -> Self {
        self.inter_batch_pause = pause;
        self
    }

    /// Set the daily call limit
    pub fn with_daily_limit(mut self, daily_limit: u32) -> Self {
        self.daily_limit = daily_limit;
        self
    }
}
