use std::sync::Arc;

use mongodb::Database;

use crate::services::access::AccessGate;
use crate::services::orchestrator::PaymentOrchestrator;
use crate::services::transaction_store::TransactionStore;

/// Shared application state. Built once in `main` with every service
/// constructed up front and injected; request handlers never reach into
/// process-wide lookups.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub transaction_store: Arc<dyn TransactionStore>,
    pub access_gate: AccessGate,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(
        db: Database,
        orchestrator: Arc<PaymentOrchestrator>,
        transaction_store: Arc<dyn TransactionStore>,
        access_gate: AccessGate,
        jwt_secret: String,
    ) -> Self {
        AppState {
            db,
            orchestrator,
            transaction_store,
            access_gate,
            jwt_secret,
        }
    }
}
