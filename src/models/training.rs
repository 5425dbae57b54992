// models/training.rs
use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    Backhoe,
    Excavator,
    Forklift,
    LongTruck,
    Crane,
}

impl SessionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCategory::Backhoe => "backhoe",
            SessionCategory::Excavator => "excavator",
            SessionCategory::Forklift => "forklift",
            SessionCategory::LongTruck => "long_truck",
            SessionCategory::Crane => "crane",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "backhoe" => Some(SessionCategory::Backhoe),
            "excavator" => Some(SessionCategory::Excavator),
            "forklift" => Some(SessionCategory::Forklift),
            "long_truck" => Some(SessionCategory::LongTruck),
            "crane" => Some(SessionCategory::Crane),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Upcoming => "upcoming",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(SessionStatus::Upcoming),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Metadata for an instructional video stored on disk. The storage layer
/// is an interface contract only; the record carries what the streaming
/// endpoint needs to locate and label the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMeta {
    pub video_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,
    pub description: String,

    /// User id of the instructor who created the session.
    pub instructor: String,

    pub category: SessionCategory,
    pub status: SessionStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,

    /// User ids of enrolled participants.
    pub participants: Vec<String>,

    pub videos: Vec<VideoMeta>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SessionPageQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SessionFilterQuery {
    pub instructor: Option<String>,
    pub category: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
}
