use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::handlers::payments;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    // Admin listing requires a verified token; the payment flow itself is
    // driven by the (possibly not yet signed-in) paying client.
    let protected = Router::new()
        .route("/transactions", get(payments::list_transactions))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(payments_health))
        .route("/initialize", post(payments::initialize_payment))
        .route("/authorize", post(payments::authorize_payment))
        .route("/verify", post(payments::verify_payment))
        .route("/access", get(payments::get_access))
        .merge(protected)
}

async fn payments_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "payments",
        "timestamp": Utc::now().to_rfc3339(),
        "features": ["initialize", "authorize", "verify", "access", "transactions"]
    }))
}
