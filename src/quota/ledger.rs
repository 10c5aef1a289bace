//! Quota ledger: one metered slot per network attempt

use super::{DayClock, QuotaError, QuotaState, QuotaStore, SystemClock};
use crate::downloader::config::DAILY_QUERY_LIMIT;
use crate::metrics::record_quota_usage;
use std::sync::Mutex;
use tracing::{debug, error, info};

/// Durable daily call counter.
///
/// State is read from the store on first use, then kept in memory and
/// persisted after every increment. A change of day resets the count to zero
/// before the next call is metered, so the first call of a new day is call 1.
pub struct QuotaLedger {
    store: Box<dyn QuotaStore>,
    clock: Box<dyn DayClock>,
    daily_limit: u32,
    state: Mutex<Option<QuotaState>>,
}

impl QuotaLedger {
    /// Ledger over `store` using the local wall clock
    pub fn new(store: impl QuotaStore + 'static) -> Self {
        Self::with_clock(store, SystemClock)
    }

    /// Ledger over `store` with an explicit clock
    pub fn with_clock(store: impl QuotaStore + 'static, clock: impl DayClock + 'static) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(clock),
            daily_limit: DAILY_QUERY_LIMIT,
            state: Mutex::new(None),
        }
    }

    /// Override the daily call limit
    pub fn with_daily_limit(mut self, daily_limit: u32) -> Self {
        self.daily_limit = daily_limit;
        self
    }

    /// Configured daily call limit
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Last state this ledger observed or wrote, if it has been used
    pub fn snapshot(&self) -> Option<QuotaState> {
        self.state.lock().ok().and_then(|state| *state)
    }

    /// Meter one call attempt.
    ///
    /// Must be called before every network attempt. On success the new count
    /// has already been persisted and is returned (1-based call number for
    /// today). Fails with [`QuotaError::Exceeded`] without persisting anything
    /// when today's count has reached the limit.
    pub fn before_call(&self) -> Result<u32, QuotaError> {
        let mut guard = self.state.lock().map_err(|_| QuotaError::Poisoned)?;
        let today = self.clock.day_of_month();
        let first_call = guard.is_none();

        let mut state = match *guard {
            Some(state) => state,
            None => match self.store.read()? {
                Some(stored) => {
                    debug!(
                        day = stored.day_of_month,
                        calls_today = stored.calls_today,
                        "Loaded persisted quota state"
                    );
                    stored
                }
                None => {
                    debug!(day = today, "No persisted quota state, starting at zero");
                    QuotaState::fresh(today)
                }
            },
        };

        if state.day_of_month != today {
            info!(
                previous_day = state.day_of_month,
                previous_calls = state.calls_today,
                day = today,
                "Day changed, resetting quota count"
            );
            state = QuotaState::fresh(today);
        }

        if state.calls_today >= self.daily_limit {
            *guard = Some(state);
            error!(
                calls_today = state.calls_today,
                limit = self.daily_limit,
                "Queries may not exceed the daily limit"
            );
            return Err(QuotaError::Exceeded {
                calls_today: state.calls_today,
                limit: self.daily_limit,
            });
        }

        state.calls_today += 1;
        self.store.write(&state)?;
        *guard = Some(state);

        record_quota_usage(state.calls_today, self.daily_limit, first_call);
        Ok(state.calls_today)
    }
}
