//! Unit tests for decoding and normalizing provider responses

use bls_data_downloader::fetcher::{normalize, ApiResponse, ResponseStatus, SeriesRequest};
use bls_data_downloader::transform::dedupe;
use bls_data_downloader::DiagnosticKind;

const RESPONSE: &str = r#"{
    "status": "REQUEST_SUCCEEDED",
    "responseTime": 37,
    "message": ["No Data Available for Series CES0000000001 Year: 2004"],
    "Results": {
        "series": [
            {
                "seriesID": "LNS14000000",
                "data": [
                    {"year": "2005", "period": "M02", "periodName": "February", "value": "5.4", "footnotes": [{}]},
                    {"year": "2005", "period": "M01", "periodName": "January", "value": "5.3",
                     "footnotes": [{"code": "P", "text": "preliminary"}]},
                    {"year": "2005", "period": "M01", "periodName": "January", "value": "5.3",
                     "footnotes": [{"code": "P", "text": "preliminary"}]}
                ]
            },
            {
                "seriesID": "LNS14000001",
                "data": [
                    {"year": "2005", "period": "M01", "periodName": "January", "value": "-", "footnotes": [{}]}
                ]
            }
        ]
    }
}"#;

#[test]
fn test_decode_wire_response() {
    let response: ApiResponse = serde_json::from_str(RESPONSE).unwrap();
    assert_eq!(response.status, ResponseStatus::Succeeded);
    assert_eq!(response.response_time, Some(37));
    assert_eq!(response.series().len(), 2);
    assert_eq!(response.series()[0].data_points.len(), 3);
}

#[test]
fn test_normalize_then_dedupe() {
    let response: ApiResponse = serde_json::from_str(RESPONSE).unwrap();
    let output = normalize(&[response]);

    assert_eq!(output.records.len(), 4);
    assert_eq!(
        output.diagnostics[0].kind,
        DiagnosticKind::NoData {
            series_id: "CES0000000001".to_string(),
            year: 2004
        }
    );

    let records = dedupe(output.records);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].period, "M02");
    assert_eq!(
        records[1].footnotes.as_deref(),
        Some(r#"[{"code":"P","text":"preliminary"}]"#)
    );
    assert_eq!(records[2].series_id, "LNS14000001");
    assert_eq!(records[2].value, None);
}

#[test]
fn test_rejected_status_decodes() {
    let body = r#"{"status":"REQUEST_NOT_PROCESSED","responseTime":5,
                   "message":["Daily threshold for total number of requests allocated to API key has been reached."],
                   "Results":null}"#;
    let response: ApiResponse = serde_json::from_str(body).unwrap();
    assert!(!response.is_succeeded());
    assert_eq!(response.status.as_str(), "REQUEST_NOT_PROCESSED");
    assert!(response.series().is_empty());
}

#[test]
fn test_request_wire_format() {
    let request = SeriesRequest::new(
        vec!["LNS14000000".to_string()],
        2000,
        2005,
        Some("key".to_string()),
    );
    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "seriesid": ["LNS14000000"],
            "startyear": "2000",
            "endyear": "2005",
            "registrationKey": "key"
        })
    );

    let anonymous = SeriesRequest::new(vec!["A".to_string()], 2000, 2001, None);
    let body = serde_json::to_value(&anonymous).unwrap();
    assert!(body.get("registrationKey").is_none());
}

#[test]
fn test_badly_shaped_rows_become_degenerate_records() {
    let body = r#"{
        "status": "REQUEST_SUCCEEDED",
        "message": [null, "No Data Available for Series CES0000000001 Year: 2004"],
        "Results": {"series": [{
            "seriesID": 12345,
            "data": [
                {"year": "2005", "period": "M01", "periodName": "January", "value": "5.3", "footnotes": [{}]},
                "garbage"
            ]
        }]}
    }"#;
    let response: ApiResponse = serde_json::from_str(body).unwrap();
    let output = normalize(&[response]);

    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[0].series_id, "12345");
    assert_eq!(output.records[0].value, Some(5.3));
    assert_eq!(output.records[1].series_id, "12345");
    assert_eq!(output.records[1].year, None);
    assert_eq!(output.records[1].period, "");

    assert_eq!(output.diagnostics.len(), 2);
    assert!(matches!(output.diagnostics[0].kind, DiagnosticKind::NoData { .. }));
    assert!(matches!(
        output.diagnostics[1].kind,
        DiagnosticKind::Malformed { .. }
    ));
}
