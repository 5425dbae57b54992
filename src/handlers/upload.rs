use axum::{
    extract::Path,
    http::StatusCode,
    response::Response,
};
use std::path::Path as StdPath;
use tokio_util::io::ReaderStream;

use crate::errors::{AppError, Result};

pub async fn serve_resume(Path(file_name): Path<String>) -> Result<Response> {
    // Security: prevent path traversal
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return Err(AppError::DocumentNotFound);
    }

    let file_path = format!("uploads/resumes/{}", file_name);

    if !StdPath::new(&file_path).is_file() {
        return Err(AppError::DocumentNotFound);
    }

    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(|_| AppError::DocumentNotFound)?;

    let stream = ReaderStream::new(file);

    let content_type = if file_path.ends_with(".pdf") {
        "application/pdf"
    } else if file_path.ends_with(".doc") {
        "application/msword"
    } else if file_path.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else {
        "application/octet-stream"
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("content-type", content_type)
        .body(axum::body::Body::from_stream(stream))
        .map_err(|_| AppError::Backend)?;

    Ok(response)
}
