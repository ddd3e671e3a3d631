//! Upload, progress and download endpoints

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{OptimizeError, Result};
use crate::optimizer::{path_resolver::OUTPUT_FILE, MediaOptimizer};
use crate::state::{JobStage, TaskId};

/// Response from `POST /upload`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub task_id: TaskId,
}

/// Response from `GET /progress/:task_id`
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: u8,
    pub current_file: String,
    pub status: JobStage,
    pub ready: bool,
}

/// POST /upload - multipart fields `file` (zip archive) and `compression`
pub async fn upload(State(optimizer): State<MediaOptimizer>, mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut compression = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OptimizeError::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| OptimizeError::InvalidInput(format!("failed to read upload: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            "compression" => {
                compression = field
                    .text()
                    .await
                    .map_err(|e| OptimizeError::InvalidInput(format!("failed to read compression: {}", e)))?;
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (filename, data) = file.ok_or_else(|| OptimizeError::InvalidInput("no file uploaded".to_string()))?;
    let task_id = optimizer.submit(filename.as_deref(), &data, &compression).await?;

    Ok(Json(UploadResponse { task_id }))
}

/// GET /progress/:task_id
pub async fn progress(
    State(optimizer): State<MediaOptimizer>,
    Path(task_id): Path<String>,
) -> Result<Json<ProgressResponse>> {
    let id = parse_task_id(&task_id)?;
    let snapshot = optimizer.progress(&id)?;

    Ok(Json(ProgressResponse {
        progress: snapshot.progress,
        ready: snapshot.is_ready(),
        current_file: snapshot.current_file,
        status: snapshot.stage,
    }))
}

/// GET /download/:task_id - streams the finished archive
pub async fn download(State(optimizer): State<MediaOptimizer>, Path(task_id): Path<String>) -> Result<Response> {
    let id = parse_task_id(&task_id)?;
    let path = optimizer.output(&id)?;

    // evicted between the readiness check and the open
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| OptimizeError::NotReady(id.to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", OUTPUT_FILE)),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

fn parse_task_id(raw: &str) -> Result<TaskId> {
    raw.parse()
        .map_err(|_| OptimizeError::TaskNotFound(raw.to_string()))
}
