// services/orchestrator.rs
use std::sync::Arc;

use mongodb::bson::doc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::{AppError, Result};
use crate::models::payment::{PaymentOutcome, PaymentRecord, TransactionStatus};
use crate::services::korapay::{GatewayResult, KorapayClient, ProviderStatus};
use crate::services::transaction_store::{TransactionStore, TransitionUpdate};

/// Statuses a record can still move out of.
const ACTIVE: &[TransactionStatus] = &[
    TransactionStatus::Pending,
    TransactionStatus::AwaitingAuthorization,
    TransactionStatus::Processing,
];

#[derive(Debug, Clone)]
pub struct InitiatePayment {
    pub email: String,
    pub amount: i64,
    pub reference: String,
    pub selected_course: Option<String>,
    pub mobile_number: String,
    pub mobile_network: String,
}

/// Drives one payment attempt through its lifecycle: create the record,
/// talk to the gateway, reconcile the provider's asynchronous status into
/// a terminal outcome. Holds its collaborators by injection; no retries
/// of its own (polling `verify` is the caller's policy).
pub struct PaymentOrchestrator {
    gateway: KorapayClient,
    store: Arc<dyn TransactionStore>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(gateway: KorapayClient, store: Arc<dyn TransactionStore>, currency: impl Into<String>) -> Self {
        PaymentOrchestrator {
            gateway,
            store,
            currency: currency.into(),
        }
    }

    /// Creates the `pending` record, then asks the gateway to start the
    /// charge. The record is written BEFORE the gateway call so a crash in
    /// between leaves an auditable `pending` row rather than a lost
    /// payment. The same record is updated afterwards; a second record is
    /// never created for one reference.
    pub async fn initiate(&self, request: InitiatePayment) -> Result<PaymentOutcome> {
        self.validate_initiate(&request)?;

        let now = chrono::Utc::now();
        let record = PaymentRecord {
            id: None,
            reference: request.reference.clone(),
            email: request.email.clone(),
            amount_requested: request.amount,
            amount_confirmed: None,
            status: TransactionStatus::Pending,
            metadata: doc! {
                "selectedCourse": request.selected_course.clone().unwrap_or_default(),
                "mobileNumber": request.mobile_number.clone(),
                "mobileNetwork": request.mobile_network.clone(),
            },
            gateway_payload: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_pending(&record).await?;
        info!("Transaction {} created as pending", request.reference);

        let course = request
            .selected_course
            .as_deref()
            .unwrap_or("course enrollment");
        let description = format!("Payment for {}", course);

        let metadata = json!({
            "selectedCourse": request.selected_course,
            "email": request.email,
            "mobileNumber": request.mobile_number,
            "mobileNetwork": request.mobile_network,
        });

        let gateway_result = match self
            .gateway
            .initiate_charge(
                &request.reference,
                request.amount,
                &self.currency,
                &request.email,
                &request.mobile_number,
                &request.mobile_network,
                &description,
                &metadata,
            )
            .await
        {
            Ok(result) => result,
            Err(err @ (AppError::NetworkError(_) | AppError::GatewayRejected(_))) => {
                // A timed-out, unreachable, or contract-breaking gateway may
                // not have seen the charge at all; the attempt is dead
                // either way.
                self.record_failure(
                    &request.reference,
                    TransactionStatus::GatewayInitFailed,
                    json!({ "error": err.to_string() }),
                )
                .await;
                return Err(err);
            }
            Err(err) => {
                error!("Unexpected fault initiating {}: {}", request.reference, err);
                self.mark_backend_error(&request.reference).await;
                return Err(err);
            }
        };

        let next = match gateway_result.status {
            ProviderStatus::Success => TransactionStatus::Success,
            ProviderStatus::Processing => TransactionStatus::Processing,
            ProviderStatus::AwaitingAuthorization => TransactionStatus::AwaitingAuthorization,
            ProviderStatus::Failed => TransactionStatus::GatewayInitFailed,
        };

        self.apply_transition(&request.reference, &[TransactionStatus::Pending], next, &gateway_result)
            .await
    }

    /// Submits the one-time authorization code for a charge the provider
    /// parked as `awaiting_authorization`.
    pub async fn authorize(&self, reference: &str, token: &str) -> Result<PaymentOutcome> {
        if reference.trim().is_empty() || token.trim().is_empty() {
            return Err(AppError::invalid_data(
                "Reference and authorization token are required.",
            ));
        }

        let record = self
            .store
            .find_by_reference(reference)
            .await?
            .ok_or(AppError::TransactionNotFound)?;

        if record.status != TransactionStatus::AwaitingAuthorization {
            return Err(AppError::invalid_data(format!(
                "Transaction {} is not awaiting authorization (status: {})",
                reference, record.status
            )));
        }

        let gateway_result = match self.gateway.authorize_charge(reference, token).await {
            Ok(result) => result,
            Err(err @ AppError::NetworkError(_)) => return Err(err),
            Err(err @ AppError::GatewayRejected(_)) => {
                self.record_failure(
                    reference,
                    TransactionStatus::GatewayInitFailed,
                    json!({ "error": err.to_string() }),
                )
                .await;
                return Err(err);
            }
            Err(err) => {
                error!("Unexpected fault authorizing {}: {}", reference, err);
                self.mark_backend_error(reference).await;
                return Err(err);
            }
        };

        let next = match gateway_result.status {
            ProviderStatus::Success => TransactionStatus::Success,
            ProviderStatus::Processing => TransactionStatus::Processing,
            ProviderStatus::AwaitingAuthorization => TransactionStatus::AwaitingAuthorization,
            // A rejected OTP kills the initiation; the caller needs a new
            // reference to try again.
            ProviderStatus::Failed => TransactionStatus::GatewayInitFailed,
        };

        self.apply_transition(
            reference,
            &[TransactionStatus::AwaitingAuthorization],
            next,
            &gateway_result,
        )
        .await
    }

    /// Reconciles a transaction against the provider's current state.
    /// Never fabricates a record, never moves a terminal record, and
    /// treats an amount disagreement as a security failure rather than
    /// something to auto-correct.
    pub async fn verify(&self, reference: &str) -> Result<PaymentOutcome> {
        if reference.trim().is_empty() {
            return Err(AppError::invalid_data(
                "Transaction reference is required for verification.",
            ));
        }

        let record = self
            .store
            .find_by_reference(reference)
            .await?
            .ok_or(AppError::TransactionNotFound)?;

        // Terminal records answer from storage; re-verifying is idempotent.
        if record.status.is_terminal() {
            return Ok(Self::outcome_from_record(&record));
        }

        let gateway_result = match self.gateway.verify_charge(reference).await {
            Ok(result) => result,
            Err(err @ AppError::NetworkError(_)) => {
                // Leave the record where it is; the caller polls again.
                warn!("Verification of {} failed to reach the gateway", reference);
                return Err(err);
            }
            Err(err @ AppError::GatewayRejected(_)) => {
                self.record_failure(
                    reference,
                    TransactionStatus::GatewayVerifyFailed,
                    json!({ "error": err.to_string() }),
                )
                .await;
                return Err(err);
            }
            Err(err) => {
                error!("Unexpected fault verifying {}: {}", reference, err);
                self.mark_backend_error(reference).await;
                return Err(err);
            }
        };

        let (next, update) = if gateway_result.ok {
            match gateway_result.status {
                ProviderStatus::Success => match gateway_result.amount {
                    Some(confirmed) if confirmed == record.amount_requested => (
                        TransactionStatus::Success,
                        TransitionUpdate::payload(gateway_result.raw.clone())
                            .with_confirmed_amount(confirmed),
                    ),
                    Some(confirmed) => {
                        warn!(
                            "Amount mismatch on {}: requested {}, gateway confirmed {}",
                            reference, record.amount_requested, confirmed
                        );
                        (
                            TransactionStatus::AmountMismatch,
                            TransitionUpdate::payload(gateway_result.raw.clone())
                                .with_confirmed_amount(confirmed),
                        )
                    }
                    // A success claim without an amount cannot pass the
                    // integrity check.
                    None => (
                        TransactionStatus::GatewayVerifyFailed,
                        TransitionUpdate::payload(gateway_result.raw.clone()),
                    ),
                },
                // Charge still in flight at the provider; stay verifiable.
                ProviderStatus::Processing | ProviderStatus::AwaitingAuthorization => (
                    TransactionStatus::Processing,
                    TransitionUpdate::payload(gateway_result.raw.clone()),
                ),
                ProviderStatus::Failed => (
                    TransactionStatus::GatewayVerifyFailed,
                    TransitionUpdate::payload(gateway_result.raw.clone()),
                ),
            }
        } else {
            (
                TransactionStatus::GatewayVerifyFailed,
                TransitionUpdate::payload(gateway_result.raw.clone()),
            )
        };

        match self.store.transition(reference, ACTIVE, next, update).await {
            Ok(Some(updated)) => {
                let mut outcome = Self::outcome_from_record(&updated);
                if !gateway_result.message.is_empty() {
                    outcome.message = gateway_result.message;
                }
                Ok(outcome)
            }
            Ok(None) => self.stored_outcome(reference).await,
            Err(err) => {
                error!("Failed to persist verification of {}: {}", reference, err);
                self.mark_backend_error(reference).await;
                Err(AppError::Backend)
            }
        }
    }

    fn validate_initiate(&self, request: &InitiatePayment) -> Result<()> {
        if request.email.trim().is_empty()
            || request.reference.trim().is_empty()
            || request.mobile_number.trim().is_empty()
            || request.mobile_network.trim().is_empty()
        {
            return Err(AppError::invalid_data(
                "Email, amount, reference, mobile number, and mobile network are all required.",
            ));
        }
        if request.amount <= 0 {
            return Err(AppError::invalid_data(
                "Amount must be a positive number of minor units.",
            ));
        }
        Ok(())
    }

    /// Applies a gateway-driven transition and builds the caller-facing
    /// outcome. Losing the precondition race is not an error: some other
    /// caller moved the record first, so their result is reported.
    async fn apply_transition(
        &self,
        reference: &str,
        allowed_prior: &[TransactionStatus],
        next: TransactionStatus,
        gateway_result: &GatewayResult,
    ) -> Result<PaymentOutcome> {
        let update = TransitionUpdate::payload(gateway_result.raw.clone());

        match self.store.transition(reference, allowed_prior, next, update).await {
            Ok(Some(updated)) => {
                info!("Transaction {} moved to {}", reference, updated.status);
                let mut outcome = Self::outcome_from_record(&updated);
                if !gateway_result.message.is_empty() {
                    outcome.message = gateway_result.message.clone();
                }
                Ok(outcome)
            }
            Ok(None) => {
                warn!("Transaction {} was transitioned concurrently", reference);
                self.stored_outcome(reference).await
            }
            Err(err) => {
                error!("Failed to persist transition of {}: {}", reference, err);
                self.mark_backend_error(reference).await;
                Err(AppError::Backend)
            }
        }
    }

    async fn stored_outcome(&self, reference: &str) -> Result<PaymentOutcome> {
        let record = self
            .store
            .find_by_reference(reference)
            .await?
            .ok_or(AppError::TransactionNotFound)?;
        Ok(Self::outcome_from_record(&record))
    }

    fn outcome_from_record(record: &PaymentRecord) -> PaymentOutcome {
        PaymentOutcome {
            status: record.status,
            message: record.status.default_message().to_string(),
            amount: record.amount_confirmed,
            data: record
                .gateway_payload
                .as_ref()
                .and_then(|raw| raw.get("data").cloned().or_else(|| Some(raw.clone()))),
        }
    }

    /// Best-effort terminal marker for faults inside the flow. The record
    /// must never sit in an ambiguous state with no error on file.
    async fn mark_backend_error(&self, reference: &str) {
        match self
            .store
            .transition(
                reference,
                ACTIVE,
                TransactionStatus::BackendError,
                TransitionUpdate::default(),
            )
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => warn!("Transaction {} already terminal; backend_error not applied", reference),
            Err(err) => error!("Failed to mark {} as backend_error: {}", reference, err),
        }
    }

    async fn record_failure(&self, reference: &str, status: TransactionStatus, payload: serde_json::Value) {
        match self
            .store
            .transition(reference, ACTIVE, status, TransitionUpdate::payload(payload))
            .await
        {
            Ok(Some(_)) => info!("Transaction {} marked {}", reference, status),
            Ok(None) => warn!("Transaction {} already terminal; {} not applied", reference, status),
            Err(err) => error!("Failed to mark {} as {}: {}", reference, status, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::korapay::KorapayConfig;
    use crate::services::transaction_store::InMemoryTransactionStore;

    fn request(reference: &str, amount: i64) -> InitiatePayment {
        InitiatePayment {
            email: "student@example.com".to_string(),
            amount,
            reference: reference.to_string(),
            selected_course: Some("Backhoe Operation".to_string()),
            mobile_number: "0241234567".to_string(),
            mobile_network: "MTN".to_string(),
        }
    }

    fn orchestrator_against(server: &MockServer) -> (PaymentOrchestrator, Arc<InMemoryTransactionStore>) {
        let store = Arc::new(InMemoryTransactionStore::new());
        let gateway = KorapayClient::new(
            KorapayConfig::new("sk_test_secret", server.uri())
                .with_timeout(Duration::from_millis(250)),
        )
        .unwrap();
        (
            PaymentOrchestrator::new(gateway, store.clone(), "GHS"),
            store,
        )
    }

    async fn mock_initiate(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mock_verify(server: &MockServer, reference: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/charges/verify/{}", reference)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn processing_body(reference: &str) -> serde_json::Value {
        json!({
            "status": true,
            "message": "Charge initiated",
            "data": {"reference": reference, "status": "processing"}
        })
    }

    fn verified_body(reference: &str, amount: i64) -> serde_json::Value {
        json!({
            "status": true,
            "message": "Verification successful",
            "data": {"reference": reference, "status": "successful", "amount": amount}
        })
    }

    // Scenario: gateway accepts the charge as processing, later confirms
    // the exact requested amount.
    #[tokio::test]
    async fn processing_charge_verifies_to_success_on_matching_amount() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-1")).await;
        mock_verify(&server, "ref-1", verified_body("ref-1", 50000)).await;

        let (orchestrator, store) = orchestrator_against(&server);

        let outcome = orchestrator.initiate(request("ref-1", 50000)).await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Processing);
        assert!(outcome.accepted());
        assert!(!outcome.is_success());

        let record = store.find_by_reference("ref-1").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Processing);

        let outcome = orchestrator.verify("ref-1").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Success);
        assert!(outcome.is_success());
        assert_eq!(outcome.amount, Some(50000));

        let record = store.find_by_reference("ref-1").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Success);
        assert_eq!(record.amount_confirmed, Some(50000));
    }

    // Scenario: gateway claims success for a cheaper amount than the
    // caller declared. This must land in amount_mismatch, not success.
    #[tokio::test]
    async fn confirmed_amount_mismatch_is_terminal_and_not_a_success() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-2")).await;
        mock_verify(&server, "ref-2", verified_body("ref-2", 40000)).await;

        let (orchestrator, store) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-2", 50000)).await.unwrap();
        let outcome = orchestrator.verify("ref-2").await.unwrap();

        assert_eq!(outcome.status, TransactionStatus::AmountMismatch);
        assert!(!outcome.is_success());
        assert!(!outcome.accepted());

        let record = store.find_by_reference("ref-2").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::AmountMismatch);
        assert_eq!(record.amount_requested, 50000);
        assert_eq!(record.amount_confirmed, Some(40000));
    }

    #[tokio::test]
    async fn missing_mobile_network_rejects_before_creating_a_record() {
        let server = MockServer::start().await;
        let (orchestrator, store) = orchestrator_against(&server);

        let mut bad = request("ref-3", 50000);
        bad.mobile_network = String::new();

        let err = orchestrator.initiate(bad).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(store.find_by_reference("ref-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn verifying_an_unknown_reference_is_not_found() {
        let server = MockServer::start().await;
        let (orchestrator, _) = orchestrator_against(&server);

        let err = orchestrator.verify("unknown-ref").await.unwrap_err();
        assert!(matches!(err, AppError::TransactionNotFound));
    }

    // Scenario: the gateway times out during initiation. The record must
    // not sit in pending forever with no error recorded.
    #[tokio::test]
    async fn gateway_timeout_during_initiate_marks_init_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({"status": true})),
            )
            .mount(&server)
            .await;

        let (orchestrator, store) = orchestrator_against(&server);

        let err = orchestrator.initiate(request("ref-4", 50000)).await.unwrap_err();
        assert!(matches!(err, AppError::NetworkError(_)));

        let record = store.find_by_reference("ref-4").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::GatewayInitFailed);
        assert!(record.gateway_payload.is_some());
    }

    #[tokio::test]
    async fn provider_rejection_during_initiate_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Invalid mobile network"
            })))
            .mount(&server)
            .await;

        let (orchestrator, store) = orchestrator_against(&server);

        let outcome = orchestrator.initiate(request("ref-5", 50000)).await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::GatewayInitFailed);
        assert_eq!(outcome.message, "Invalid mobile network");
        assert!(!outcome.accepted());

        let record = store.find_by_reference("ref-5").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::GatewayInitFailed);
    }

    #[tokio::test]
    async fn a_reference_is_never_reused() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-6")).await;

        let (orchestrator, _) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-6", 50000)).await.unwrap();
        let err = orchestrator.initiate(request("ref-6", 50000)).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateReference));
    }

    // Terminal records answer from storage without another gateway read,
    // so repeated verification cannot flip the outcome.
    #[tokio::test]
    async fn verify_is_idempotent_once_terminal() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-7")).await;

        Mock::given(method("GET"))
            .and(path("/charges/verify/ref-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(verified_body("ref-7", 50000)))
            .expect(1)
            .mount(&server)
            .await;

        let (orchestrator, _) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-7", 50000)).await.unwrap();
        let first = orchestrator.verify("ref-7").await.unwrap();
        let second = orchestrator.verify("ref-7").await.unwrap();

        assert_eq!(first.status, TransactionStatus::Success);
        assert_eq!(second.status, TransactionStatus::Success);
        assert_eq!(second.amount, Some(50000));
    }

    #[tokio::test]
    async fn verify_while_provider_still_processing_stays_pollable() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-8")).await;
        mock_verify(
            &server,
            "ref-8",
            json!({
                "status": true,
                "message": "Charge pending",
                "data": {"reference": "ref-8", "status": "pending"}
            }),
        )
        .await;

        let (orchestrator, store) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-8", 50000)).await.unwrap();
        let outcome = orchestrator.verify("ref-8").await.unwrap();

        assert_eq!(outcome.status, TransactionStatus::Processing);
        let record = store.find_by_reference("ref-8").await.unwrap().unwrap();
        assert!(!record.status.is_terminal());
    }

    #[tokio::test]
    async fn failed_verification_marks_verify_failed() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-9")).await;
        mock_verify(
            &server,
            "ref-9",
            json!({
                "status": false,
                "message": "Charge expired",
                "data": {"reference": "ref-9", "status": "expired"}
            }),
        )
        .await;

        let (orchestrator, store) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-9", 50000)).await.unwrap();
        let outcome = orchestrator.verify("ref-9").await.unwrap();

        assert_eq!(outcome.status, TransactionStatus::GatewayVerifyFailed);
        let record = store.find_by_reference("ref-9").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::GatewayVerifyFailed);
    }

    #[tokio::test]
    async fn otp_charge_authorizes_into_processing_then_verifies() {
        let server = MockServer::start().await;
        mock_initiate(
            &server,
            json!({
                "status": true,
                "message": "Authorize with OTP",
                "data": {"reference": "ref-10", "status": "processing", "auth_model": "OTP"}
            }),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/charges/mobile-money/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization accepted",
                "data": {"reference": "ref-10", "status": "processing"}
            })))
            .mount(&server)
            .await;
        mock_verify(&server, "ref-10", verified_body("ref-10", 50000)).await;

        let (orchestrator, store) = orchestrator_against(&server);

        let outcome = orchestrator.initiate(request("ref-10", 50000)).await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::AwaitingAuthorization);

        let outcome = orchestrator.authorize("ref-10", "123456").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Processing);

        let outcome = orchestrator.verify("ref-10").await.unwrap();
        assert_eq!(outcome.status, TransactionStatus::Success);
        assert_eq!(
            store
                .find_by_reference("ref-10")
                .await
                .unwrap()
                .unwrap()
                .amount_confirmed,
            Some(50000)
        );
    }

    #[tokio::test]
    async fn authorize_requires_an_awaiting_authorization_record() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-11")).await;

        let (orchestrator, _) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-11", 50000)).await.unwrap();
        let err = orchestrator.authorize("ref-11", "123456").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn success_claim_without_an_amount_fails_verification() {
        let server = MockServer::start().await;
        mock_initiate(&server, processing_body("ref-12")).await;
        mock_verify(
            &server,
            "ref-12",
            json!({
                "status": true,
                "message": "Verification successful",
                "data": {"reference": "ref-12", "status": "successful"}
            }),
        )
        .await;

        let (orchestrator, store) = orchestrator_against(&server);

        orchestrator.initiate(request("ref-12", 50000)).await.unwrap();
        let outcome = orchestrator.verify("ref-12").await.unwrap();

        assert_eq!(outcome.status, TransactionStatus::GatewayVerifyFailed);
        let record = store.find_by_reference("ref-12").await.unwrap().unwrap();
        assert_eq!(record.amount_confirmed, None);
    }
}
