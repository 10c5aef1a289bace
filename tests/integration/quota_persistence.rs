//! Integration tests for the file-backed quota ledger

use bls_data_downloader::quota::{
    FileQuotaStore, FixedClock, QuotaError, QuotaLedger, QuotaState, QuotaStore,
};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_every_call_is_appended_and_synced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("query_count.txt");
    let ledger = QuotaLedger::with_clock(FileQuotaStore::new(&path), FixedClock::new(7));

    for expected in 1..=3 {
        assert_eq!(ledger.before_call().unwrap(), expected);
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "1,7\n2,7\n3,7\n");
}

#[test]
fn test_restart_reads_last_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("query_count.txt");
    std::fs::write(&path, "10,7\n11,7\n42,7\n").unwrap();

    let ledger = QuotaLedger::with_clock(FileQuotaStore::new(&path), FixedClock::new(7));
    assert_eq!(ledger.before_call().unwrap(), 43);
}

#[test]
fn test_day_change_mid_run_resets_to_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("query_count.txt");
    let clock = Arc::new(FixedClock::new(30));
    let ledger = QuotaLedger::with_clock(FileQuotaStore::new(&path), clock.clone());

    ledger.before_call().unwrap();
    ledger.before_call().unwrap();
    clock.set_day(31);

    assert_eq!(ledger.before_call().unwrap(), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "1,31\n");
}

#[test]
fn test_limit_is_enforced_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("query_count.txt");
    let store = FileQuotaStore::new(&path);
    store
        .write(&QuotaState {
            day_of_month: 2,
            calls_today: 500,
        })
        .unwrap();

    let ledger = QuotaLedger::with_clock(FileQuotaStore::new(&path), FixedClock::new(2));
    let err = ledger.before_call().unwrap_err();
    assert!(matches!(
        err,
        QuotaError::Exceeded {
            calls_today: 500,
            limit: 500
        }
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "500,2\n");
}
