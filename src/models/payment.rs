// models/payment.rs
use chrono::{DateTime, Utc};
use mongodb::bson;
use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

/// Lifecycle status of one payment attempt. A reference moves through at
/// most one path of this machine and never leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    AwaitingAuthorization,
    Processing,
    Success,
    AmountMismatch,
    GatewayInitFailed,
    GatewayVerifyFailed,
    BackendError,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::AwaitingAuthorization => "awaiting_authorization",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Success => "success",
            TransactionStatus::AmountMismatch => "amount_mismatch",
            TransactionStatus::GatewayInitFailed => "gateway_init_failed",
            TransactionStatus::GatewayVerifyFailed => "gateway_verify_failed",
            TransactionStatus::BackendError => "backend_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "awaiting_authorization" => Some(TransactionStatus::AwaitingAuthorization),
            "processing" => Some(TransactionStatus::Processing),
            "success" => Some(TransactionStatus::Success),
            "amount_mismatch" => Some(TransactionStatus::AmountMismatch),
            "gateway_init_failed" => Some(TransactionStatus::GatewayInitFailed),
            "gateway_verify_failed" => Some(TransactionStatus::GatewayVerifyFailed),
            "backend_error" => Some(TransactionStatus::BackendError),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Success
                | TransactionStatus::AmountMismatch
                | TransactionStatus::GatewayInitFailed
                | TransactionStatus::GatewayVerifyFailed
                | TransactionStatus::BackendError
        )
    }

    /// Only a confirmed success ever unlocks paid content.
    pub fn grants_access(&self) -> bool {
        matches!(self, TransactionStatus::Success)
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Transaction created, awaiting gateway response.",
            TransactionStatus::AwaitingAuthorization => "Authorization required. Enter the OTP sent to your phone.",
            TransactionStatus::Processing => "Charge is processing. Approve the prompt on your phone.",
            TransactionStatus::Success => "Payment verified successfully.",
            TransactionStatus::AmountMismatch => "Confirmed amount does not match the amount requested.",
            TransactionStatus::GatewayInitFailed => "The gateway could not initiate this charge.",
            TransactionStatus::GatewayVerifyFailed => "The gateway could not verify this charge.",
            TransactionStatus::BackendError => "Internal error while processing this transaction.",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One payment attempt, keyed by the caller-generated `reference`.
/// Records are never deleted; failures stay on file for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub reference: String,
    pub email: String,

    /// Amount declared by the caller at initiation, in minor units (pesewas).
    pub amount_requested: i64,

    /// Amount the gateway confirmed on verification. Set once, never
    /// overwritten with a different value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_confirmed: Option<i64>,

    pub status: TransactionStatus,

    /// Course selection and mobile-money details captured at initiation.
    pub metadata: Document,

    /// Last raw gateway response, overwritten on each interaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payload: Option<serde_json::Value>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Caller-facing result of an initiate/authorize/verify call.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub status: TransactionStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        self.status.grants_access()
    }

    /// Whether the gateway accepted the attempt (the caller should keep
    /// polling rather than treat the response as a failure).
    pub fn accepted(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Success
                | TransactionStatus::Processing
                | TransactionStatus::AwaitingAuthorization
        )
    }
}

/// Durable "paid" flag behind the access gate, one per payer email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub email: String,

    /// Reference of the transaction that granted access.
    pub reference: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub granted_at: DateTime<Utc>,
}
