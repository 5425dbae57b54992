use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod database;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use database::connection::{ensure_user_indexes, get_db_client};
use errors::Result;
use services::access::AccessGate;
use services::korapay::{KorapayClient, KorapayConfig};
use services::orchestrator::PaymentOrchestrator;
use services::transaction_store::MongoTransactionStore;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // A deployment that accepts payments without the gateway credential
    // would silently drop money; refuse to start instead.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ CRITICAL: {}", e);
            std::process::exit(1);
        }
    };

    create_directories().await;

    let db = match get_db_client(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match initialize_app_state(db, &config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("❌ Failed to initialize services: {}", e);
            std::process::exit(1);
        }
    };

    let app = build_router(app_state);
    start_server(app, &config).await;
}

async fn create_directories() {
    let dirs = ["uploads/videos", "uploads/resumes"];
    for dir in dirs {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::warn!("Failed to create {}: {}", dir, e);
        }
    }
}

async fn initialize_app_state(db: mongodb::Database, config: &AppConfig) -> Result<AppState> {
    ensure_user_indexes(&db).await?;

    // The unique reference index is the idempotency boundary; starting
    // without it would allow duplicate payment records.
    let store = Arc::new(MongoTransactionStore::new(&db));
    store.init_indexes().await?;

    let access_gate = AccessGate::new(&db);
    access_gate.init_indexes().await?;

    let gateway = KorapayClient::new(KorapayConfig::new(
        config.korapay_secret_key.clone(),
        config.korapay_base_url.clone(),
    ))?;

    let orchestrator = Arc::new(PaymentOrchestrator::new(
        gateway,
        store.clone(),
        config.currency.clone(),
    ));

    tracing::info!("✅ Payment orchestrator initialized");
    tracing::info!("🌐 Gateway base URL: {}", config.korapay_base_url);

    Ok(AppState::new(
        db,
        orchestrator,
        store,
        access_gate,
        config.jwt_secret.clone(),
    ))
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .route(
            "/api/uploads/resumes/:file_name",
            get(handlers::upload::serve_resume),
        )
        .nest("/api/auth", routes::auth::routes(app_state.clone()))
        .nest("/api/training", routes::training::routes(app_state.clone()))
        .nest("/api/jobs", routes::jobs::routes(app_state.clone()))
        .nest("/api/payments", routes::payments::routes(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) {
    let addr = SocketAddr::new(
        config.host.parse().unwrap_or_else(|_| [0, 0, 0, 0].into()),
        config.port,
    );

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "🚜 EquipCert Training API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    use mongodb::bson::doc;

    let db_status = match state.db.run_command(doc! {"ping": 1}).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "payments": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
