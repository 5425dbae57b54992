use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/payments/initialize`. Field names follow the
/// browser client's camelCase payload.
#[derive(Debug, Deserialize, Validate)]
pub struct InitializePaymentRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    /// Enrollment fee in minor units (pesewas).
    #[validate(range(min = 1, message = "Amount must be a positive number of minor units"))]
    pub amount: i64,

    #[validate(length(min = 1, message = "Transaction reference is required"))]
    pub reference: String,

    #[serde(rename = "selectedCourse")]
    pub selected_course: Option<String>,

    #[serde(rename = "mobileNumber")]
    #[validate(length(min = 1, message = "Mobile number is required"))]
    pub mobile_number: String,

    #[serde(rename = "mobileNetwork")]
    #[validate(length(min = 1, message = "Mobile network is required"))]
    pub mobile_network: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AuthorizePaymentRequest {
    #[validate(length(min = 1, message = "Transaction reference is required"))]
    pub reference: String,

    #[validate(length(min = 1, message = "Authorization token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "Transaction reference is required"))]
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_request_requires_every_mobile_money_field() {
        let payload: InitializePaymentRequest = serde_json::from_value(serde_json::json!({
            "email": "student@example.com",
            "amount": 50000,
            "reference": "ref-1",
            "selectedCourse": "Backhoe Operation",
            "mobileNumber": "0241234567",
            "mobileNetwork": ""
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn initialize_request_rejects_non_positive_amounts() {
        let payload: InitializePaymentRequest = serde_json::from_value(serde_json::json!({
            "email": "student@example.com",
            "amount": 0,
            "reference": "ref-1",
            "mobileNumber": "0241234567",
            "mobileNetwork": "MTN"
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
