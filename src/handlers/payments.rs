// handlers/payments.rs
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::dtos::payment_dtos::{
    AccessQuery, AuthorizePaymentRequest, InitializePaymentRequest, TransactionListQuery,
    VerifyPaymentRequest,
};
use crate::errors::{AppError, Result};
use crate::models::payment::{PaymentOutcome, TransactionStatus};
use crate::models::user::Claims;
use crate::services::orchestrator::InitiatePayment;
use crate::state::AppState;

pub async fn initialize_payment(
    State(state): State<AppState>,
    Json(payload): Json<InitializePaymentRequest>,
) -> Result<Response> {
    payload.validate()?;

    info!("Payment initialization requested for {}", payload.reference);

    let outcome = state
        .orchestrator
        .initiate(InitiatePayment {
            email: payload.email.clone(),
            amount: payload.amount,
            reference: payload.reference.clone(),
            selected_course: payload.selected_course.clone(),
            mobile_number: payload.mobile_number.clone(),
            mobile_network: payload.mobile_network.clone(),
        })
        .await?;

    // Some charges settle at initiation; the gate only reacts to success.
    state
        .access_gate
        .grant_on(&outcome, &payload.email, &payload.reference)
        .await?;

    Ok(initiation_response(&outcome))
}

pub async fn authorize_payment(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizePaymentRequest>,
) -> Result<Response> {
    payload.validate()?;

    let outcome = state
        .orchestrator
        .authorize(&payload.reference, &payload.token)
        .await?;

    if outcome.is_success() {
        grant_from_record(&state, &payload.reference, &outcome).await?;
    }

    Ok(initiation_response(&outcome))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Response> {
    payload.validate()?;

    let outcome = state.orchestrator.verify(&payload.reference).await?;

    if outcome.is_success() {
        grant_from_record(&state, &payload.reference, &outcome).await?;
    }

    Ok(verification_response(&outcome))
}

pub async fn get_access(
    State(state): State<AppState>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<serde_json::Value>> {
    if query.email.trim().is_empty() {
        return Err(AppError::invalid_data("Email is required"));
    }

    let paid = state.access_gate.is_paid(&query.email).await?;

    Ok(Json(json!({
        "success": true,
        "paid": paid,
    })))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<serde_json::Value>> {
    if !claims.role.can_manage_sessions() {
        return Err(AppError::Unauthorized);
    }

    let status = match query.status.as_deref() {
        Some(s) => Some(
            TransactionStatus::parse(s)
                .ok_or_else(|| AppError::invalid_data(format!("Unknown status '{}'", s)))?,
        ),
        None => None,
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state.transaction_store.list(status, page, limit).await?;

    let transactions: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            json!({
                "reference": r.reference,
                "email": r.email,
                "amountRequested": r.amount_requested,
                "amountConfirmed": r.amount_confirmed,
                "status": r.status,
                "createdAt": r.created_at.to_rfc3339(),
                "updatedAt": r.updated_at.to_rfc3339(),
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "page": page,
        "limit": limit,
        "total": total,
        "transactions": transactions,
    })))
}

/// The verified transaction carries the payer email the gate is keyed by.
async fn grant_from_record(state: &AppState, reference: &str, outcome: &PaymentOutcome) -> Result<()> {
    let record = state
        .transaction_store
        .find_by_reference(reference)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    state.access_gate.grant_on(outcome, &record.email, reference).await?;
    Ok(())
}

/// Initiation/authorization responses: 200 for every gateway-accepted
/// outcome, gateway-shaped errors otherwise.
fn initiation_response(outcome: &PaymentOutcome) -> Response {
    if outcome.accepted() {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": outcome.status,
                "message": outcome.message,
                "data": outcome.data,
            })),
        )
            .into_response();
    }

    let status_code = match outcome.status {
        TransactionStatus::BackendError => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };

    (
        status_code,
        Json(json!({
            "success": false,
            "status": outcome.status,
            "message": outcome.message,
        })),
    )
        .into_response()
}

fn verification_response(outcome: &PaymentOutcome) -> Response {
    match outcome.status {
        TransactionStatus::Success => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": outcome.status,
                "amount": outcome.amount,
                "message": outcome.message,
            })),
        )
            .into_response(),

        // Still in flight at the provider; the client keeps polling.
        TransactionStatus::Pending
        | TransactionStatus::Processing
        | TransactionStatus::AwaitingAuthorization => (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "status": outcome.status,
                "message": outcome.message,
            })),
        )
            .into_response(),

        TransactionStatus::AmountMismatch => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "status": outcome.status,
                "message": outcome.message,
            })),
        )
            .into_response(),

        TransactionStatus::GatewayInitFailed | TransactionStatus::GatewayVerifyFailed => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "success": false,
                "status": outcome.status,
                "message": outcome.message,
            })),
        )
            .into_response(),

        TransactionStatus::BackendError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "status": outcome.status,
                "message": "Internal server error during payment verification.",
            })),
        )
            .into_response(),
    }
}
