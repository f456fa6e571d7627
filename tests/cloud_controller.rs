// ABOUTME: Integration tests for the controller bits client against a local axum server.
// ABOUTME: Checks the multipart wire format, job polling, failures, and remote fingerprints.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cfship::artifact::fingerprint_bytes;
use cfship::platform::{BitsOps, BitsTimeouts, CloudControllerBits, PlatformError};
use cfship::types::AppGuid;
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Default)]
struct Recorded {
    upload_headers: Option<HeaderMap>,
    upload_body: Vec<u8>,
    copy_requests: Vec<(String, Value)>,
    job_polls: u32,
}

type Shared = Arc<Mutex<Recorded>>;

fn job(guid: &str, status: &str) -> Value {
    json!({
        "metadata": { "guid": guid, "url": format!("/v2/jobs/{guid}") },
        "entity": { "guid": guid, "status": status }
    })
}

async fn upload(
    State(state): State<Shared>,
    Path(_app): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let mut s = state.lock();
    s.upload_headers = Some(headers);
    s.upload_body = body.to_vec();
    Json(job("job-ok", "queued"))
}

async fn copy_bits(
    State(state): State<Shared>,
    Path(target): Path<String>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let guid = if target == "broken" { "job-fail" } else { "job-ok" };
    state.lock().copy_requests.push((target, request));
    Json(job(guid, "queued"))
}

async fn job_status(State(state): State<Shared>, Path(guid): Path<String>) -> Json<Value> {
    let polls = {
        let mut s = state.lock();
        s.job_polls += 1;
        s.job_polls
    };
    if guid == "job-fail" {
        return Json(json!({
            "metadata": { "guid": guid },
            "entity": {
                "guid": guid,
                "status": "failed",
                "error_details": {
                    "code": 170011,
                    "description": "Stager error: staging failed",
                    "error_code": "CF-StagingError"
                }
            }
        }));
    }
    let status = if polls < 2 { "running" } else { "finished" };
    Json(job(&guid, status))
}

async fn download(Path(app): Path<String>) -> Vec<u8> {
    if app == "empty" {
        Vec::new()
    } else {
        vec![42u8; 8000]
    }
}

async fn controller() -> (CloudControllerBits, Shared) {
    support::init_tracing();
    let state = Shared::default();
    let router = Router::new()
        .route("/v2/apps/{app}/bits", put(upload))
        .route("/v2/apps/{app}/copy_bits", post(copy_bits))
        .route("/v2/apps/{app}/download", get(download))
        .route("/v2/jobs/{guid}", get(job_status))
        .with_state(Arc::clone(&state));
    let base = support::serve(router).await;

    let bits = CloudControllerBits::new(reqwest::Client::new(), &base, "token-123").with_timeouts(
        BitsTimeouts {
            job_interval: Duration::from_millis(10),
            upload_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(5),
        },
    );
    (bits, state)
}

#[tokio::test]
async fn upload_sends_documented_multipart_body() {
    let (bits, state) = controller().await;
    let archive = b"PK\x03\x04 pretend zip".to_vec();
    let size = archive.len() as u64;

    bits.upload_bits(
        &AppGuid::new("app-1"),
        Box::new(std::io::Cursor::new(archive.clone())),
        size,
    )
    .await
    .unwrap();

    let s = state.lock();
    let headers = s.upload_headers.as_ref().unwrap();
    assert_eq!(headers["authorization"], "bearer token-123");
    assert!(
        headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("multipart/form-data; boundary=")
    );

    let body = String::from_utf8_lossy(&s.upload_body).to_ascii_lowercase();
    assert!(body.contains("name=\"resources\"\r\n\r\n[]"), "{body}");
    assert!(
        body.contains("name=\"application\"; filename=\"application.zip\""),
        "{body}"
    );
    assert!(body.contains("content-type: application/zip"), "{body}");
    assert!(body.contains("content-transfer-encoding: binary"), "{body}");
    assert!(body.contains(&format!("content-length: {size}")), "{body}");
    assert!(body.contains("pk\x03\x04 pretend zip"), "{body}");

    // Finished on the second poll.
    assert_eq!(s.job_polls, 2);
}

#[tokio::test]
async fn copy_bits_posts_source_and_waits() {
    let (bits, state) = controller().await;

    bits.copy_bits(&AppGuid::new("origin"), &AppGuid::new("replacement"))
        .await
        .unwrap();

    let s = state.lock();
    assert_eq!(
        s.copy_requests,
        vec![(
            "replacement".to_string(),
            json!({ "source_app_guid": "origin" })
        )]
    );
}

#[tokio::test]
async fn failed_job_reports_error_details() {
    let (bits, _) = controller().await;

    let err = bits
        .copy_bits(&AppGuid::new("origin"), &AppGuid::new("broken"))
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::JobFailed { code: 170011, .. }));
    assert_eq!(
        err.to_string(),
        "Error CF-StagingError, Stager error: staging failed [code: 170011]"
    );
}

#[tokio::test]
async fn remote_fingerprint_reads_download_prefix() {
    let (bits, _) = controller().await;

    let fingerprint = bits.remote_fingerprint(&AppGuid::new("app-1")).await.unwrap();
    assert_eq!(fingerprint, fingerprint_bytes(&[42u8; 8000]));

    let empty = bits.remote_fingerprint(&AppGuid::new("empty")).await.unwrap();
    assert_eq!(empty, fingerprint_bytes(b""));
}
