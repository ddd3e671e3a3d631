//! API integration tests
//!
//! Tests for HTTP API endpoints using axum's test utilities.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use space_bundle_optimizer::{server::create_router, AdapterError, Config, MediaCodec, MediaOptimizer};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;

const BOUNDARY: &str = "----bundle-optimizer-test";

/// Uppercases file contents in place
struct UppercaseCodec;

impl UppercaseCodec {
    fn apply(path: &Path) -> Result<(), AdapterError> {
        let data = std::fs::read(path)?;
        std::fs::write(path, data.to_ascii_uppercase())?;
        Ok(())
    }
}

impl MediaCodec for UppercaseCodec {
    fn reencode_image(&self, path: &Path, _quality: u8) -> Result<(), AdapterError> {
        Self::apply(path)
    }

    fn reencode_audio(&self, path: &Path, _bitrate: &str) -> Result<(), AdapterError> {
        Self::apply(path)
    }
}

async fn create_test_app(dir: &TempDir) -> Router {
    let config = Config {
        work_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let optimizer = MediaOptimizer::with_codec(config, Arc::new(UppercaseCodec)).await.unwrap();
    create_router(optimizer)
}

fn bundle() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("images/logo.webp", SimpleFileOptions::default()).unwrap();
    writer.write_all(b"logo").unwrap();
    writer.start_file("media/theme.webm", SimpleFileOptions::default()).unwrap();
    writer.write_all(b"theme").unwrap();
    writer.finish().unwrap().into_inner()
}

fn multipart_upload(filename: Option<&str>, payload: &[u8], compression: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(filename) = filename {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/zip\r\n\r\n"
        )
        .unwrap();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(compression) = compression {
        write!(
            body,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"compression\"\r\n\r\n{compression}\r\n"
        )
        .unwrap();
    }
    write!(body, "--{BOUNDARY}--\r\n").unwrap();

    Request::post("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir).await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_progress_unknown_task() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir).await;

    for uri in [
        "/progress/6f1c2a0e-4b1d-4f7e-9a52-0d4c1b8e7a10",
        "/progress/not-a-task",
    ] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response.into_body()).await;
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_download_unknown_task() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir).await;

    let response = get(&app, "/download/6f1c2a0e-4b1d-4f7e-9a52-0d4c1b8e7a10").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_rejects_invalid_files() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir).await;
    let zip = bundle();

    let requests = [
        multipart_upload(None, b"", Some("low")),
        multipart_upload(Some("bundle.tar.gz"), &zip, None),
        multipart_upload(Some("bundle.zip"), b"", None),
        multipart_upload(Some("bundle.zip"), b"plain text", None),
    ];

    for request in requests {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().starts_with("Invalid file"));
    }
}

#[tokio::test]
async fn test_upload_poll_download() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(multipart_upload(Some("bundle.zip"), &bundle(), Some("high")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task_id = body_json(response.into_body()).await["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let mut last_progress = 0;
    let mut finished = None;
    for _ in 0..500 {
        let response = get(&app, &format!("/progress/{task_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;

        let progress = json["progress"].as_u64().unwrap();
        assert!(progress >= last_progress);
        last_progress = progress;

        if json["status"] == "completed" || json["status"] == "failed" {
            finished = Some(json);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let json = finished.expect("task did not finish");
    assert_eq!(json["progress"], 100);
    assert_eq!(json["current_file"], "Done");
    assert_eq!(json["status"], "completed");
    assert_eq!(json["ready"], true);

    let response = get(&app, &format!("/download/{task_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"optimized_export.zip\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut logo = String::new();
    archive.by_name("images/logo.webp").unwrap().read_to_string(&mut logo).unwrap();
    assert_eq!(logo, "LOGO");
    let mut theme = String::new();
    archive.by_name("media/theme.webm").unwrap().read_to_string(&mut theme).unwrap();
    assert_eq!(theme, "THEME");
}
