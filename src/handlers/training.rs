// handlers/training.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    Extension,
};
use axum_extra::extract::Multipart;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use serde_json::json;
use std::path::Path as StdPath;
use tokio::fs;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::training::{
    SessionCategory, SessionFilterQuery, SessionPageQuery, SessionStatus, TrainingSession,
    VideoMeta,
};
use crate::models::user::Claims;
use crate::state::AppState;

const MAX_VIDEO_SIZE: u64 = 200 * 1024 * 1024; // 200MB
const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "mov", "webm", "mkv"];
const ALLOWED_UPDATES: [&str; 4] = ["title", "startTime", "endTime", "status"];

fn sessions(state: &AppState) -> Collection<TrainingSession> {
    state.db.collection("training_sessions")
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    if !claims.role.can_manage_sessions() {
        return Err(AppError::Unauthorized);
    }

    let mut title = String::new();
    let mut description = String::new();
    let mut category = String::new();
    let mut start_time = String::new();
    let mut end_time = String::new();
    let mut video_data = None;
    let mut video_name = String::new();
    let mut file_extension = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => {
                title = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "description" => {
                description = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "category" => {
                category = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "startTime" => {
                start_time = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "endTime" => {
                end_time = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "video" => {
                let file_name = field.file_name().unwrap_or("video").to_string();
                let data = field.bytes().await.map_err(|e| AppError::Multipart(e.to_string()))?;

                if data.len() as u64 > MAX_VIDEO_SIZE {
                    return Err(AppError::FileTooLarge);
                }

                let ext = StdPath::new(&file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("")
                    .to_lowercase();

                if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
                    return Err(AppError::InvalidFileFormat);
                }

                video_name = file_name;
                file_extension = Some(ext);
                video_data = Some(data);
            }
            _ => {}
        }
    }

    if title.is_empty() || description.is_empty() || category.is_empty() {
        return Err(AppError::invalid_data("Title, description and category are required"));
    }

    let category = SessionCategory::parse(&category)
        .ok_or_else(|| AppError::invalid_data(format!("Unknown category '{}'", category)))?;

    let start_time = parse_rfc3339(&start_time, "startTime")?;
    let end_time = parse_rfc3339(&end_time, "endTime")?;
    if end_time <= start_time {
        return Err(AppError::invalid_data("endTime must be after startTime"));
    }

    let video_data = video_data.ok_or(AppError::NoFileProvided)?;
    let file_extension = file_extension.ok_or(AppError::InvalidFileFormat)?;

    fs::create_dir_all("uploads/videos").await.map_err(AppError::Io)?;

    let video_id = Uuid::new_v4();
    let file_name = format!("{}.{}", video_id, file_extension);
    let file_path = format!("uploads/videos/{}", file_name);

    fs::write(&file_path, &video_data).await.map_err(AppError::Io)?;

    let now = Utc::now();
    let video = VideoMeta {
        video_id,
        title: video_name,
        file_name,
        content_type: content_type_for(&file_extension).to_string(),
        size_bytes: video_data.len() as u64,
        uploaded_at: now,
    };

    let session_id = ObjectId::new();
    let session = TrainingSession {
        id: Some(session_id),
        title: title.clone(),
        description,
        instructor: claims.sub.clone(),
        category,
        status: SessionStatus::Upcoming,
        start_time,
        end_time,
        participants: Vec::new(),
        videos: vec![video],
        created_at: now,
        updated_at: now,
    };

    sessions(&state).insert_one(&session).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Training session created successfully",
        "data": {
            "id": session_id.to_hex(),
            "title": title,
            "videoId": video_id,
        }
    })))
}

pub async fn get_all_videos(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let cursor = sessions(&state).find(doc! {}).await?;
    let all: Vec<TrainingSession> = cursor.try_collect().await?;

    let videos: Vec<serde_json::Value> = all
        .iter()
        .flat_map(|session| {
            let session_id = session.id.map(|id| id.to_hex()).unwrap_or_default();
            let session_title = session.title.clone();
            session.videos.iter().map(move |v| {
                json!({
                    "videoId": v.video_id,
                    "title": v.title,
                    "sessionId": session_id,
                    "sessionTitle": session_title,
                    "contentType": v.content_type,
                    "sizeBytes": v.size_bytes,
                })
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": videos.len(),
        "videos": videos,
    })))
}

/// Streams a stored instructional video. The storage layer is a plain
/// file tree; the response body is a byte stream, never a full read.
pub async fn stream_video(
    State(state): State<AppState>,
    Path(video_id): Path<Uuid>,
) -> Result<Response> {
    let session = sessions(&state)
        .find_one(doc! { "videos.video_id": video_id.to_string() })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    let video = session
        .videos
        .iter()
        .find(|v| v.video_id == video_id)
        .ok_or(AppError::DocumentNotFound)?;

    let file_path = format!("uploads/videos/{}", video.file_name);

    if !StdPath::new(&file_path).is_file() {
        return Err(AppError::DocumentNotFound);
    }

    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(|_| AppError::DocumentNotFound)?;

    let stream = ReaderStream::new(file);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header("content-type", video.content_type.clone())
        .header("cache-control", "public, max-age=31536000")
        .body(axum::body::Body::from_stream(stream))
        .map_err(|_| AppError::Backend)?;

    Ok(response)
}

pub async fn upcoming_sessions(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let filter = doc! {
        "status": "upcoming",
        "start_time": { "$gt": bson::DateTime::now() },
    };

    let cursor = sessions(&state)
        .find(filter)
        .sort(doc! { "start_time": 1 })
        .await?;
    let upcoming: Vec<TrainingSession> = cursor.try_collect().await?;

    Ok(Json(json!({
        "success": true,
        "count": upcoming.len(),
        "data": upcoming,
    })))
}

pub async fn enroll(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    // Enrollment is paid content; the gate decides, never the client.
    if !state.access_gate.is_paid(&claims.email).await? {
        return Err(AppError::PaymentRequired);
    }

    let object_id = ObjectId::parse_str(&session_id)?;
    let collection = sessions(&state);

    let session = collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    if session.participants.contains(&claims.sub) {
        return Err(AppError::invalid_data("User already enrolled in this session"));
    }

    if session.status != SessionStatus::Upcoming {
        return Err(AppError::invalid_data("Session is already completed or cancelled"));
    }

    let updated = collection
        .find_one_and_update(
            doc! { "_id": object_id, "status": "upcoming" },
            doc! {
                "$addToSet": { "participants": &claims.sub },
                "$set": { "updated_at": bson::DateTime::now() },
            },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    Ok(Json(json!({
        "success": true,
        "data": updated,
    })))
}

pub async fn paginate_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionPageQuery>,
) -> Result<Json<serde_json::Value>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let skip = (page - 1) * limit as u64;

    let collection = sessions(&state);
    let filter = doc! { "status": "upcoming" };

    let total = collection.count_documents(filter.clone()).await?;
    let cursor = collection
        .find(filter)
        .sort(doc! { "start_time": 1 })
        .skip(skip)
        .limit(limit)
        .await?;
    let page_sessions: Vec<TrainingSession> = cursor.try_collect().await?;

    Ok(Json(json!({
        "success": true,
        "page": page,
        "limit": limit,
        "total": total,
        "data": page_sessions,
    })))
}

pub async fn filter_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionFilterQuery>,
) -> Result<Json<serde_json::Value>> {
    let mut filter = Document::new();

    if let Some(instructor) = &query.instructor {
        filter.insert("instructor", instructor.as_str());
    }
    if let Some(category) = &query.category {
        let category = SessionCategory::parse(category)
            .ok_or_else(|| AppError::invalid_data(format!("Unknown category '{}'", category)))?;
        filter.insert("category", category.as_str());
    }
    if let Some(from_date) = query.from_date {
        filter.insert("start_time", doc! { "$gt": bson::DateTime::from_chrono(from_date) });
    }

    let cursor = sessions(&state).find(filter).await?;
    let matching: Vec<TrainingSession> = cursor.try_collect().await?;

    Ok(Json(json!({
        "success": true,
        "count": matching.len(),
        "data": matching,
    })))
}

pub async fn update_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    if !claims.role.can_manage_sessions() {
        return Err(AppError::Unauthorized);
    }

    let object_id = ObjectId::parse_str(&session_id)?;

    let body = payload
        .as_object()
        .ok_or_else(|| AppError::invalid_data("Request body must be a JSON object"))?;

    let mut set = Document::new();
    for (field, value) in body {
        match field.as_str() {
            "title" => {
                let title = value
                    .as_str()
                    .ok_or_else(|| AppError::invalid_data("title must be a string"))?;
                set.insert("title", title);
            }
            "startTime" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| AppError::invalid_data("startTime must be a string"))?;
                set.insert("start_time", bson::DateTime::from_chrono(parse_rfc3339(raw, "startTime")?));
            }
            "endTime" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| AppError::invalid_data("endTime must be a string"))?;
                set.insert("end_time", bson::DateTime::from_chrono(parse_rfc3339(raw, "endTime")?));
            }
            "status" => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| AppError::invalid_data("status must be a string"))?;
                let status = SessionStatus::parse(raw)
                    .ok_or_else(|| AppError::invalid_data(format!("Unknown status '{}'", raw)))?;
                set.insert("status", status.as_str());
            }
            other => {
                return Err(AppError::invalid_data(format!(
                    "Invalid update field '{}'. Allowed fields: {}",
                    other,
                    ALLOWED_UPDATES.join(", ")
                )));
            }
        }
    }

    if set.is_empty() {
        return Err(AppError::invalid_data("No update fields provided"));
    }
    set.insert("updated_at", bson::DateTime::now());

    let updated = sessions(&state)
        .find_one_and_update(doc! { "_id": object_id }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    Ok(Json(json!({
        "success": true,
        "data": updated,
    })))
}

fn parse_rfc3339(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::invalid_data(format!("{} must be an RFC 3339 timestamp", field)))
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_allowed_extensions() {
        for ext in ALLOWED_EXTENSIONS {
            assert_ne!(content_type_for(ext), "application/octet-stream");
        }
        assert_eq!(content_type_for("exe"), "application/octet-stream");
    }

    #[test]
    fn rfc3339_parsing_rejects_garbage() {
        assert!(parse_rfc3339("2026-09-01T09:00:00Z", "startTime").is_ok());
        assert!(parse_rfc3339("next tuesday", "startTime").is_err());
    }
}
