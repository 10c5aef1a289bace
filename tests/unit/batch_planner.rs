//! Unit tests for batch planning

use bls_data_downloader::downloader::{plan, plan_default};

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("S{i}")).collect()
}

#[test]
fn test_batch_count_is_ceiling() {
    for (n, expected) in [(0, 0), (1, 1), (49, 1), (50, 1), (51, 2), (100, 2), (101, 3), (120, 3)] {
        let ids = ids(n);
        assert_eq!(plan_default(&ids).count(), expected, "n={n}");
        assert_eq!(plan_default(&ids).batch_count(), expected, "n={n}");
    }
}

#[test]
fn test_only_last_batch_is_short() {
    let ids = ids(120);
    let sizes: Vec<usize> = plan_default(&ids).map(|b| b.len()).collect();
    assert_eq!(sizes, vec![50, 50, 20]);
}

#[test]
fn test_concatenation_reproduces_input() {
    let ids = ids(137);
    let joined: Vec<String> = plan(&ids, 25).flat_map(|b| b.series_ids).collect();
    assert_eq!(joined, ids);
}

#[test]
fn test_batch_indices_are_sequential() {
    let ids = ids(120);
    let indices: Vec<usize> = plan_default(&ids).map(|b| b.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}
