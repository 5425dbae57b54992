// services/korapay.rs
use std::time::Duration;

use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::errors::{AppError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct KorapayConfig {
    pub secret_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl KorapayConfig {
    pub fn new(secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        KorapayConfig {
            secret_key: secret_key.into(),
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Provider status normalized out of the gateway's variable JSON shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Success,
    Processing,
    AwaitingAuthorization,
    Failed,
}

/// Narrow result every gateway interaction collapses into. `raw` keeps the
/// last provider payload for the audit trail; nothing downstream reads
/// provider fields directly.
#[derive(Debug, Clone)]
pub struct GatewayResult {
    pub ok: bool,
    pub status: ProviderStatus,
    pub message: String,
    pub amount: Option<i64>,
    pub raw: Value,
}

#[derive(Debug, Serialize)]
struct ChargeCustomer<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ChargeMobileMoney<'a> {
    number: &'a str,
    network: &'a str,
}

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    reference: &'a str,
    amount: i64,
    currency: &'a str,
    customer: ChargeCustomer<'a>,
    mobile_money: ChargeMobileMoney<'a>,
    description: &'a str,
    metadata: &'a Value,
}

#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    reference: &'a str,
    token: &'a str,
}

/// Stateless client for the mobile-money processor. Holds nothing but the
/// HTTP client and credentials; every call is one request/response pair.
#[derive(Debug, Clone)]
pub struct KorapayClient {
    config: KorapayConfig,
    client: Client,
}

impl KorapayClient {
    pub fn new(config: KorapayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(KorapayClient { config, client })
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.config.secret_key.trim().is_empty() {
            return Err(AppError::configuration("KoraPay secret key is not set"));
        }
        Ok(())
    }

    /// Starts a mobile-money charge. Transport failures surface as
    /// `NetworkError`; the provider declining is reported in the returned
    /// `GatewayResult` (`ok == false`) together with its raw payload so the
    /// caller can persist it.
    pub async fn initiate_charge(
        &self,
        reference: &str,
        amount_minor: i64,
        currency: &str,
        email: &str,
        mobile_number: &str,
        mobile_network: &str,
        description: &str,
        metadata: &Value,
    ) -> Result<GatewayResult> {
        self.ensure_configured()?;

        if reference.trim().is_empty() {
            return Err(AppError::invalid_data("Transaction reference is required"));
        }
        if amount_minor <= 0 {
            return Err(AppError::invalid_data("Amount must be a positive number of minor units"));
        }

        info!("Initiating mobile money charge {} for {} {}", reference, amount_minor, currency);

        let request = ChargeRequest {
            reference,
            amount: amount_minor,
            currency,
            customer: ChargeCustomer { email },
            mobile_money: ChargeMobileMoney {
                number: mobile_number,
                network: mobile_network,
            },
            description,
            metadata,
        };

        let url = format!("{}/charges/mobile-money", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.secret_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        self.decode(reference, response, false).await
    }

    /// Queries the current state of a previously initiated charge.
    /// Safe to call repeatedly; the provider treats it as a read.
    pub async fn verify_charge(&self, reference: &str) -> Result<GatewayResult> {
        self.ensure_configured()?;

        if reference.trim().is_empty() {
            return Err(AppError::invalid_data("Transaction reference is required"));
        }

        info!("Verifying charge {}", reference);

        let url = format!("{}/charges/verify/{}", self.config.base_url, reference);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.secret_key))
            .send()
            .await?;

        self.decode(reference, response, true).await
    }

    /// Submits the one-time code for a charge the provider parked behind
    /// OTP authorization.
    pub async fn authorize_charge(&self, reference: &str, token: &str) -> Result<GatewayResult> {
        self.ensure_configured()?;

        if reference.trim().is_empty() || token.trim().is_empty() {
            return Err(AppError::invalid_data("Reference and authorization token are required"));
        }

        info!("Authorizing charge {}", reference);

        let url = format!("{}/charges/mobile-money/authorize", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.secret_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&AuthorizeRequest { reference, token })
            .send()
            .await?;

        self.decode(reference, response, false).await
    }

    /// Collapses a provider response into the normalized result. The JSON
    /// shape varies by status, so every field read is optional.
    async fn decode(
        &self,
        reference: &str,
        response: reqwest::Response,
        verifying: bool,
    ) -> Result<GatewayResult> {
        let http_status = response.status();
        let body = response.text().await?;

        let parsed: std::result::Result<Value, _> = serde_json::from_str(&body);

        if !http_status.is_success() {
            let raw = parsed.unwrap_or_else(|_| Value::String(body.clone()));
            let message = raw
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("No message from gateway")
                .to_string();

            error!("Gateway returned {} for {}: {}", http_status, reference, message);
            return Ok(GatewayResult {
                ok: false,
                status: ProviderStatus::Failed,
                message,
                amount: None,
                raw,
            });
        }

        // A 2xx that is not JSON violates the provider contract outright.
        let raw = match parsed {
            Ok(value) => value,
            Err(_) => {
                error!("Gateway returned an unparseable 2xx body for {}", reference);
                return Err(AppError::gateway("Gateway returned an unparseable response"));
            }
        };

        let message = raw
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("No message from gateway")
            .to_string();

        let envelope_ok = match raw.get("status") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "success" || s == "processing",
            _ => false,
        };

        let data = raw.get("data");
        let data_status = data
            .and_then(|d| d.get("status"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let auth_model = data
            .and_then(|d| d.get("auth_model"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let amount = data.and_then(|d| d.get("amount")).and_then(parse_amount);

        let status = if !envelope_ok {
            ProviderStatus::Failed
        } else {
            match data_status {
                "success" | "successful" | "paid" => ProviderStatus::Success,
                "processing" | "pending" => {
                    if auth_model.eq_ignore_ascii_case("otp") {
                        ProviderStatus::AwaitingAuthorization
                    } else {
                        ProviderStatus::Processing
                    }
                }
                // Verification must only report success on an explicit
                // confirmed status; an absent data block is not success.
                "" if !verifying => ProviderStatus::Processing,
                _ => ProviderStatus::Failed,
            }
        };

        let ok = status != ProviderStatus::Failed;

        if ok {
            info!("Gateway accepted {} ({:?})", reference, status);
        } else {
            error!("Gateway declined {}: {}", reference, message);
        }

        Ok(GatewayResult {
            ok,
            status,
            message,
            amount,
            raw,
        })
    }
}

/// The provider reports amounts as a JSON number or a numeric string
/// depending on endpoint; accept both, always in minor units.
fn parse_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.parse::<i64>().ok().or_else(|| {
            s.parse::<f64>().ok().map(|f| f.round() as i64)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> KorapayClient {
        KorapayClient::new(KorapayConfig::new("sk_test_secret", server.uri())).unwrap()
    }

    #[test]
    fn parse_amount_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_amount(&json!(50000)), Some(50000));
        assert_eq!(parse_amount(&json!(50000.0)), Some(50000));
        assert_eq!(parse_amount(&json!("50000")), Some(50000));
        assert_eq!(parse_amount(&json!("bogus")), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }

    #[tokio::test]
    async fn initiate_charge_normalizes_processing_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .and(header("authorization", "Bearer sk_test_secret"))
            .and(body_partial_json(json!({"reference": "ref-1", "amount": 50000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Charge initiated",
                "data": {"reference": "ref-1", "status": "processing"}
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .initiate_charge("ref-1", 50000, "GHS", "a@b.com", "0241234567", "MTN", "Backhoe", &json!({}))
            .await
            .unwrap();

        assert!(result.ok);
        assert_eq!(result.status, ProviderStatus::Processing);
    }

    #[tokio::test]
    async fn initiate_charge_detects_otp_authorization() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorize with OTP",
                "data": {"reference": "ref-otp", "status": "processing", "auth_model": "OTP"}
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .initiate_charge("ref-otp", 30000, "GHS", "a@b.com", "0241234567", "MTN", "Forklift", &json!({}))
            .await
            .unwrap();

        assert_eq!(result.status, ProviderStatus::AwaitingAuthorization);
    }

    #[tokio::test]
    async fn initiate_charge_reports_provider_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Invalid mobile network"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .initiate_charge("ref-2", 50000, "GHS", "a@b.com", "0241234567", "XYZ", "Backhoe", &json!({}))
            .await
            .unwrap();

        assert!(!result.ok);
        assert_eq!(result.status, ProviderStatus::Failed);
        assert_eq!(result.message, "Invalid mobile network");
    }

    #[tokio::test]
    async fn verify_charge_extracts_confirmed_amount() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/charges/verify/ref-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "message": "Verification successful",
                "data": {"reference": "ref-3", "status": "successful", "amount": 50000}
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).verify_charge("ref-3").await.unwrap();

        assert!(result.ok);
        assert_eq!(result.status, ProviderStatus::Success);
        assert_eq!(result.amount, Some(50000));
    }

    #[tokio::test]
    async fn verify_charge_without_data_block_is_not_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/charges/verify/ref-4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "ok"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).verify_charge("ref-4").await.unwrap();

        assert!(!result.ok);
        assert_eq!(result.status, ProviderStatus::Failed);
    }

    #[tokio::test]
    async fn timeout_surfaces_as_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/charges/mobile-money"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"status": true})),
            )
            .mount(&server)
            .await;

        let client = KorapayClient::new(
            KorapayConfig::new("sk_test_secret", server.uri())
                .with_timeout(Duration::from_millis(50)),
        )
        .unwrap();

        let err = client
            .initiate_charge("ref-5", 50000, "GHS", "a@b.com", "0241234567", "MTN", "Crane", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NetworkError(_)));
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let client = KorapayClient::new(KorapayConfig::new("", "http://localhost:1")).unwrap();

        let err = client.verify_charge("ref-6").await.unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected_before_any_network_call() {
        let client =
            KorapayClient::new(KorapayConfig::new("sk_test_secret", "http://localhost:1")).unwrap();

        let err = client
            .initiate_charge("ref-7", 0, "GHS", "a@b.com", "0241234567", "MTN", "Backhoe", &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
