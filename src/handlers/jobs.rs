// handlers/jobs.rs
use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use axum_extra::extract::Multipart;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use serde_json::json;
use std::path::Path as StdPath;
use tokio::fs;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::job::{
    ApplicationStatus, CreateJobPosting, JobApplication, JobPosting, UpdateApplicationStatus,
};
use crate::models::user::Claims;
use crate::state::AppState;

const MAX_RESUME_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const ALLOWED_RESUME_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

fn postings(state: &AppState) -> Collection<JobPosting> {
    state.db.collection("job_postings")
}

fn applications(state: &AppState) -> Collection<JobApplication> {
    state.db.collection("job_applications")
}

pub async fn create_posting(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPosting>,
) -> Result<Json<serde_json::Value>> {
    if !claims.role.can_manage_sessions() {
        return Err(AppError::Unauthorized);
    }

    if payload.title.trim().is_empty()
        || payload.company.trim().is_empty()
        || payload.description.trim().is_empty()
    {
        return Err(AppError::invalid_data("Title, company and description are required"));
    }

    let training_requirement = match &payload.training_requirement {
        Some(id) => Some(ObjectId::parse_str(id)?),
        None => None,
    };

    let now = Utc::now();
    let mut posting = JobPosting {
        id: None,
        title: payload.title,
        company: payload.company,
        description: payload.description,
        requirements: payload.requirements,
        skills_required: payload.skills_required,
        location: payload.location,
        deadline: payload.deadline.map(bson::DateTime::from_chrono),
        training_requirement,
        created_at: now,
        updated_at: now,
    };

    let insert_result = postings(&state).insert_one(&posting).await?;
    posting.id = insert_result.inserted_id.as_object_id();

    Ok(Json(json!({
        "success": true,
        "message": "Job posting created successfully",
        "data": posting,
    })))
}

pub async fn list_postings(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let cursor = postings(&state)
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await?;
    let all: Vec<JobPosting> = cursor.try_collect().await?;

    Ok(Json(json!({
        "success": true,
        "count": all.len(),
        "data": all,
    })))
}

/// Multipart application: cover letter and skills as text fields, the
/// resume as a file. The posting must exist before anything is stored.
pub async fn submit_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    let posting_id = ObjectId::parse_str(&job_id)?;

    let posting = postings(&state)
        .find_one(doc! { "_id": posting_id })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    let mut cover_letter = String::new();
    let mut skills_raw = String::new();
    let mut training_session = None;
    let mut resume_data = None;
    let mut resume_name = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "coverLetter" => {
                cover_letter = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "skills" => {
                skills_raw = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
            }
            "trainingSession" => {
                let raw = field.text().await.map_err(|e| AppError::Multipart(e.to_string()))?;
                training_session = Some(ObjectId::parse_str(&raw)?);
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let data = field.bytes().await.map_err(|e| AppError::Multipart(e.to_string()))?;

                if data.len() as u64 > MAX_RESUME_SIZE {
                    return Err(AppError::FileTooLarge);
                }

                let ext = StdPath::new(&file_name)
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("")
                    .to_lowercase();

                if !ALLOWED_RESUME_EXTENSIONS.contains(&ext.as_str()) {
                    return Err(AppError::InvalidFileFormat);
                }

                resume_name = sanitize_filename::sanitize(&file_name);
                resume_data = Some(data);
            }
            _ => {}
        }
    }

    if cover_letter.trim().is_empty() {
        return Err(AppError::invalid_data("Cover letter is required"));
    }

    // Skills arrive as a JSON array string from the form
    let skills: Vec<String> = serde_json::from_str(&skills_raw)
        .map_err(|_| AppError::invalid_data("Skills must be a JSON array string"))?;

    let resume_data = resume_data.ok_or(AppError::NoFileProvided)?;

    fs::create_dir_all("uploads/resumes").await.map_err(AppError::Io)?;

    let stored_name = format!("{}_{}", Uuid::new_v4(), resume_name);
    let file_path = format!("uploads/resumes/{}", stored_name);
    let resume_url = format!("/api/uploads/resumes/{}", stored_name);

    fs::write(&file_path, &resume_data).await.map_err(AppError::Io)?;

    let now = Utc::now();
    let mut application = JobApplication {
        id: None,
        job_posting: posting_id,
        applicant: claims.sub.clone(),
        training_session,
        resume_url,
        cover_letter: Some(cover_letter),
        skills,
        status: ApplicationStatus::Submitted,
        created_at: now,
        updated_at: now,
    };

    let insert_result = applications(&state).insert_one(&application).await?;
    application.id = insert_result.inserted_id.as_object_id();

    Ok(Json(json!({
        "success": true,
        "message": "Job application submitted successfully",
        "data": {
            "id": application.id.map(|id| id.to_hex()),
            "jobPosting": posting.title,
            "status": application.status,
        }
    })))
}

pub async fn get_applicants(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    if !claims.role.can_manage_sessions() {
        return Err(AppError::Unauthorized);
    }

    let posting_id = ObjectId::parse_str(&job_id)?;

    let cursor = applications(&state)
        .find(doc! { "job_posting": posting_id })
        .sort(doc! { "created_at": -1 })
        .await?;
    let all: Vec<JobApplication> = cursor.try_collect().await?;

    if all.is_empty() {
        return Err(AppError::DocumentNotFound);
    }

    Ok(Json(json!({
        "success": true,
        "count": all.len(),
        "applications": all,
    })))
}

pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<String>,
    Json(payload): Json<UpdateApplicationStatus>,
) -> Result<Json<serde_json::Value>> {
    if !claims.role.can_manage_sessions() {
        return Err(AppError::Unauthorized);
    }

    let object_id = ObjectId::parse_str(&application_id)?;

    let status = ApplicationStatus::parse(&payload.status)
        .ok_or_else(|| AppError::invalid_data(format!("Unknown status '{}'", payload.status)))?;

    let updated = applications(&state)
        .find_one_and_update(
            doc! { "_id": object_id },
            doc! {
                "$set": {
                    "status": status.as_str(),
                    "updated_at": bson::DateTime::now(),
                }
            },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    Ok(Json(json!({
        "success": true,
        "message": "Job application status updated successfully",
        "data": updated,
    })))
}
