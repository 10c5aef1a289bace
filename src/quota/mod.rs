//! Daily quota ledger
//!
//! The provider allows a fixed number of calls per day. The ledger meters
//! every attempted call against a durable counter so the limit holds across
//! process restarts.

use chrono::Datelike;
use std::sync::atomic::{AtomicU32, Ordering};

pub mod ledger;
pub mod store;

pub use ledger::QuotaLedger;
pub use store::{FileQuotaStore, MemoryQuotaStore, QuotaStore};

/// Persisted ledger state: the day the count belongs to and the calls made on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    /// Day of month (1-31) the count was recorded on
    pub day_of_month: u32,
    /// Calls attempted on that day
    pub calls_today: u32,
}

impl QuotaState {
    /// Zero-count state for the given day
    pub fn fresh(day_of_month: u32) -> Self {
        Self {
            day_of_month,
            calls_today: 0,
        }
    }

    /// Encode as a single `count,day` log line (no trailing newline)
    pub fn to_line(&self) -> String {
        format!("{},{}", self.calls_today, self.day_of_month)
    }

    /// Decode a `count,day` log line. Whitespace around fields is ignored.
    pub fn parse_line(line: &str) -> Result<Self, QuotaError> {
        let (count, day) = line
            .trim()
            .split_once(',')
            .ok_or_else(|| QuotaError::CorruptRecord(format!("missing separator in {line:?}")))?;

        let calls_today = count
            .trim()
            .parse::<u32>()
            .map_err(|e| QuotaError::CorruptRecord(format!("bad call count {count:?}: {e}")))?;
        let day_of_month = day
            .trim()
            .parse::<u32>()
            .map_err(|e| QuotaError::CorruptRecord(format!("bad day {day:?}: {e}")))?;

        if !(1..=31).contains(&day_of_month) {
            return Err(QuotaError::CorruptRecord(format!(
                "day of month out of range: {day_of_month}"
            )));
        }

        Ok(Self {
            day_of_month,
            calls_today,
        })
    }
}

/// Source of the current day of month
pub trait DayClock: Send + Sync {
    /// Current day of month (1-31)
    fn day_of_month(&self) -> u32;
}

/// Local wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl DayClock for SystemClock {
    fn day_of_month(&self) -> u32 {
        chrono::Local::now().day()
    }
}

/// Clock pinned to a settable day, for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    day: AtomicU32,
}

impl FixedClock {
    /// Clock that reports `day` until changed
    pub fn new(day: u32) -> Self {
        Self {
            day: AtomicU32::new(day),
        }
    }

    /// Move the clock to another day
    pub fn set_day(&self, day: u32) {
        self.day.store(day, Ordering::SeqCst);
    }
}

impl DayClock for FixedClock {
    fn day_of_month(&self) -> u32 {
        self.day.load(Ordering::SeqCst)
    }
}

impl<C: DayClock + ?Sized> DayClock for std::sync::Arc<C> {
    fn day_of_month(&self) -> u32 {
        (**self).day_of_month()
    }
}

/// Quota ledger errors
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Daily call limit reached
    #[error("daily query limit reached: {calls_today} of {limit} calls already made today")]
    Exceeded {
        /// Calls already made today
        calls_today: u32,
        /// Configured daily limit
        limit: u32,
    },

    /// IO error on the persisted record
    #[error("IO error: {0}")]
    IoError(String),

    /// Lock error on the persisted record
    #[error("lock error: {0}")]
    LockError(String),

    /// Persisted record could not be parsed
    #[error("corrupt quota record: {0}")]
    CorruptRecord(String),

    /// In-process ledger state was poisoned by a panic
    #[error("quota ledger state poisoned")]
    Poisoned,
}
