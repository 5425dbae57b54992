// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Gateway network error: {0}")]
    NetworkError(String),

    #[error("Gateway rejected the charge: {0}")]
    GatewayRejected(String),

    #[error("Confirmed amount does not match the amount requested")]
    AmountMismatch,

    #[error("A transaction with this reference already exists")]
    DuplicateReference,

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Document not found")]
    DocumentNotFound,

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Invalid file format")]
    InvalidFileFormat,

    #[error("File too large")]
    FileTooLarge,

    #[error("No file provided")]
    NoFileProvided,

    #[error("Invalid user data")]
    InvalidUserData,

    #[error("Authentication error")]
    AuthError,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Course access requires a completed payment")]
    PaymentRequired,

    #[error("Internal server error")]
    Backend,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, "Invalid multipart data".to_string()),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string()),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error".to_string()),
            AppError::NetworkError(_) => (StatusCode::BAD_GATEWAY, "Payment gateway unreachable".to_string()),
            AppError::GatewayRejected(_) => (StatusCode::BAD_GATEWAY, "Payment gateway error".to_string()),
            AppError::AmountMismatch => (StatusCode::BAD_REQUEST, "Amount mismatch".to_string()),
            AppError::DuplicateReference => (StatusCode::CONFLICT, "Duplicate reference".to_string()),
            AppError::TransactionNotFound => (StatusCode::NOT_FOUND, "Transaction not found".to_string()),
            AppError::DocumentNotFound => (StatusCode::NOT_FOUND, "Document not found".to_string()),
            AppError::InvalidObjectId(_) => (StatusCode::BAD_REQUEST, "Invalid ID format".to_string()),
            AppError::InvalidFileFormat => (StatusCode::BAD_REQUEST, "Invalid file format".to_string()),
            AppError::FileTooLarge => (StatusCode::BAD_REQUEST, "File too large".to_string()),
            AppError::NoFileProvided => (StatusCode::BAD_REQUEST, "No file provided".to_string()),
            AppError::InvalidUserData => (StatusCode::BAD_REQUEST, "Invalid user data".to_string()),
            AppError::AuthError => (StatusCode::UNAUTHORIZED, "Authentication failed".to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Unauthorized access".to_string()),
            AppError::PaymentRequired => (StatusCode::PAYMENT_REQUIRED, "Payment required".to_string()),
            AppError::Backend => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
        };

        // Internal faults never leak detail to the caller; gateway-facing
        // errors keep the provider's message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error_message.clone()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "message": message,
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Manual From implementations
impl From<axum_extra::extract::multipart::MultipartError> for AppError {
    fn from(err: axum_extra::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::NetworkError(format!("HTTP request failed: {}", err))
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        messages.sort();
        AppError::ValidationError(messages.join(" "))
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::GatewayRejected(msg.into())
    }

    pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        use mongodb::error::{ErrorKind, WriteFailure};
        matches!(
            *err.kind,
            ErrorKind::Write(WriteFailure::WriteError(ref write_err)) if write_err.code == 11000
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
