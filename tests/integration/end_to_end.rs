//! End-to-end pipeline runs over a fake transport and a file-backed ledger

use crate::support::{data_point, series_ids, success, EventCounter, FakeTransport};
use bls_data_downloader::downloader::{
    ApiError, DownloadError, DownloadJob, RequestExecutor, SeriesPipeline,
};
use bls_data_downloader::fetcher::bls_http::decode_body;
use bls_data_downloader::fetcher::SeriesResult;
use bls_data_downloader::quota::{FileQuotaStore, FixedClock, QuotaLedger};
use bls_data_downloader::DiagnosticKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn file_pipeline(transport: Arc<FakeTransport>, quota_file: &Path, day: u32) -> SeriesPipeline {
    let ledger = QuotaLedger::with_clock(FileQuotaStore::new(quota_file), FixedClock::new(day));
    SeriesPipeline::new(RequestExecutor::new(transport, Arc::new(ledger)))
}

fn last_quota_line(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .last()
        .unwrap()
        .to_string()
}

#[tokio::test(start_paused = true)]
async fn test_120_series_over_six_years() {
    let counter = EventCounter::for_target("bls_data_downloader::downloader::executor");
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(counter.clone()));

    let dir = TempDir::new().unwrap();
    let quota_file = dir.path().join("runtime_output").join("query_count.txt");
    let transport = FakeTransport::echo_with_duplicates();
    let pipeline = file_pipeline(transport.clone(), &quota_file, 9);

    let job = DownloadJob::new(series_ids(120), 2000, 2005);
    let started = tokio::time::Instant::now();
    let report = pipeline.run(&job).await.unwrap();

    // Batches of 50, 50, 20, in input order
    let requests = transport.requests();
    let sizes: Vec<usize> = requests.iter().map(|r| r.series_ids.len()).collect();
    assert_eq!(sizes, vec![50, 50, 20]);
    let sent: Vec<String> = requests.iter().flat_map(|r| r.series_ids.clone()).collect();
    assert_eq!(sent, job.series_ids);
    assert!(requests.iter().all(|r| r.start_year == "2000" && r.end_year == "2005"));

    // Three logged successes, quota incremented by three
    assert_eq!(counter.count(Level::INFO), 3);
    assert_eq!(counter.total(), 3);
    assert_eq!(last_quota_line(&quota_file), "3,9");

    // Two inter-batch pauses of 250ms
    assert_eq!(started.elapsed(), Duration::from_millis(500));

    // 120 series x 6 years, plus one duplicated point per response
    assert_eq!(report.batches, 3);
    assert_eq!(report.data_points, 120 * 6 + 3);
    assert_eq!(report.records.len(), 120 * 6);
    assert_eq!(report.duplicates_removed(), 3);
    assert!(report.diagnostics.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_quota_continues_across_runs() {
    let dir = TempDir::new().unwrap();
    let quota_file = dir.path().join("query_count.txt");

    let first = file_pipeline(FakeTransport::echo(), &quota_file, 20);
    first
        .run(&DownloadJob::new(series_ids(60), 2010, 2012))
        .await
        .unwrap();
    assert_eq!(last_quota_line(&quota_file), "2,20");

    // A new process the same day resumes from the persisted count
    let second = file_pipeline(FakeTransport::echo(), &quota_file, 20);
    second
        .run(&DownloadJob::new(series_ids(10), 2010, 2012))
        .await
        .unwrap();
    assert_eq!(last_quota_line(&quota_file), "3,20");

    // The next day starts over and the log is rewritten
    let third = file_pipeline(FakeTransport::echo(), &quota_file, 21);
    third
        .run(&DownloadJob::new(series_ids(10), 2010, 2012))
        .await
        .unwrap();
    let contents = std::fs::read_to_string(&quota_file).unwrap();
    assert_eq!(contents.trim(), "1,21");
}

#[tokio::test(start_paused = true)]
async fn test_diagnostics_are_collected() {
    let dir = TempDir::new().unwrap();
    let response = success(
        vec![SeriesResult {
            series_id: "LNS14000000".to_string(),
            data_points: vec![
                data_point(2001, "M02", "February", "4.2"),
                data_point(2001, "M01", "January", "-"),
            ],
        }],
        vec![
            "No Data Available for Series CUUR0000SA0 Year: 2001",
            "Series does not exist for Series BOGUS01",
        ],
    );
    let transport = FakeTransport::scripted(vec![Ok(response)]);
    let pipeline = file_pipeline(transport, &dir.path().join("q.txt"), 1);

    let report = pipeline
        .run(&DownloadJob::new(
            vec![
                "LNS14000000".to_string(),
                "CUUR0000SA0".to_string(),
                "BOGUS01".to_string(),
            ],
            2001,
            2001,
        ))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[1].value, None);
    assert_eq!(
        report.diagnostics.iter().map(|d| d.kind.clone()).collect::<Vec<_>>(),
        vec![
            DiagnosticKind::NoData {
                series_id: "CUUR0000SA0".to_string(),
                year: 2001
            },
            DiagnosticKind::UnknownSeries {
                series_id: "BOGUS01".to_string()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_badly_shaped_rows_do_not_abort_run() {
    let dir = TempDir::new().unwrap();
    let body = br#"{
        "status": "REQUEST_SUCCEEDED",
        "responseTime": 20,
        "message": [null],
        "Results": {"series": [{
            "seriesID": "LNS00000000",
            "data": [
                {"year": "2001", "period": "M01", "periodName": "January", "value": "4.2", "footnotes": [{}]},
                "garbage",
                {"year": "2001", "period": "M02", "periodName": "February", "value": "4.3", "footnotes": [{}]}
            ]
        }]}
    }"#;
    let first = decode_body(body).unwrap();
    let transport = FakeTransport::scripted(vec![Ok(first)]);
    let pipeline = file_pipeline(transport.clone(), &dir.path().join("q.txt"), 1);

    let report = pipeline
        .run(&DownloadJob::new(series_ids(60), 2001, 2001))
        .await
        .unwrap();

    // Second batch still ran after the odd first response
    assert_eq!(transport.call_count(), 2);
    assert_eq!(report.data_points, 3 + 10);

    let first_series: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.series_id == "LNS00000000")
        .collect();
    assert_eq!(first_series.len(), 3);
    assert_eq!(first_series[0].value, Some(4.2));
    assert_eq!(first_series[1].year, None);
    assert_eq!(first_series[1].value, None);
    assert_eq!(first_series[2].value, Some(4.3));

    assert_eq!(report.diagnostics.len(), 1);
    assert!(matches!(
        &report.diagnostics[0].kind,
        DiagnosticKind::Malformed { series_id, .. } if series_id == "LNS00000000"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_quota_limit_stops_pipeline() {
    let dir = TempDir::new().unwrap();
    let quota_file = dir.path().join("query_count.txt");
    std::fs::write(&quota_file, "498,4\n499,4\n").unwrap();

    let transport = FakeTransport::echo();
    let pipeline = file_pipeline(transport.clone(), &quota_file, 4);

    let err = pipeline
        .run(&DownloadJob::new(series_ids(120), 2000, 2001))
        .await
        .unwrap_err();

    match err {
        DownloadError::Api(api) => assert!(api.is_quota_exceeded()),
        other => panic!("expected quota error, got {other:?}"),
    }
    // Call 500 went out; call 501 was refused before the network
    assert_eq!(transport.call_count(), 1);
    assert_eq!(last_quota_line(&quota_file), "500,4");
}

#[tokio::test(start_paused = true)]
async fn test_rejection_aborts_run() {
    let dir = TempDir::new().unwrap();
    let mut rejected = success(vec![], vec!["Invalid registration key"]);
    rejected.status = bls_data_downloader::fetcher::ResponseStatus::Other(
        "REQUEST_NOT_PROCESSED".to_string(),
    );
    let transport = FakeTransport::scripted(vec![Ok(rejected)]);
    let pipeline = file_pipeline(transport.clone(), &dir.path().join("q.txt"), 1);

    let err = pipeline
        .run(&DownloadJob::new(series_ids(75), 2000, 2001))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Api(ApiError::ApiRejected { ref status, .. }) if status == "REQUEST_NOT_PROCESSED"
    ));
    assert_eq!(transport.call_count(), 1);
}
