// config.rs
use std::env;

use crate::errors::{AppError, Result};

pub const KORAPAY_BASE_URL: &str = "https://api.korapay.com/merchant/api/v1";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub korapay_secret_key: String,
    pub korapay_base_url: String,
    pub currency: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub host: String,
}

impl AppConfig {
    /// Loads configuration from the environment. The gateway secret is a
    /// deployment requirement: without it no charge can ever be verified,
    /// so startup must fail instead of accepting payments it cannot settle.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let korapay_secret_key = env::var("KORAPAY_SECRET_KEY")
            .map_err(|_| AppError::configuration("KORAPAY_SECRET_KEY must be set"))?;

        if korapay_secret_key.trim().is_empty() {
            return Err(AppError::configuration("KORAPAY_SECRET_KEY must not be empty"));
        }

        let korapay_base_url = env::var("KORAPAY_BASE_URL")
            .unwrap_or_else(|_| KORAPAY_BASE_URL.to_string());

        let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "GHS".to_string());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::configuration("DATABASE_URL must be set"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::configuration("JWT_SECRET must be set"))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| AppError::configuration("PORT must be a number"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(AppConfig {
            korapay_secret_key,
            korapay_base_url,
            currency,
            database_url,
            jwt_secret,
            port,
            host,
        })
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "korapay_base_url": self.korapay_base_url,
            "currency": self.currency,
            "secret_key_set": !self.korapay_secret_key.is_empty(),
            "port": self.port,
            "host": self.host,
        })
    }
}
