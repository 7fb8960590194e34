use std::env;

use anyhow::Context;
use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub payment: PaymentConfig,
    pub store_currency: String,
    pub notify_webhook_url: Option<String>,
    pub pending_order_timeout_minutes: i64,
}

/// Credentials for the hosted payment gateway.
///
/// Without `PAYMENT_KEY_ID` the service issues gateway handles locally,
/// which is what development and the integration tests run against.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub key_id: Option<String>,
    pub key_secret: SecretString,
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;

        let payment = PaymentConfig {
            key_id: env::var("PAYMENT_KEY_ID").ok().filter(|v| !v.is_empty()),
            key_secret: env::var("PAYMENT_KEY_SECRET")
                .context("PAYMENT_KEY_SECRET is not set")?
                .into(),
            api_base: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
        };

        let store_currency = env::var("STORE_CURRENCY").unwrap_or_else(|_| "INR".to_string());
        let notify_webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok().filter(|v| !v.is_empty());
        let pending_order_timeout_minutes = env::var("PENDING_ORDER_TIMEOUT_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret: jwt_secret.into(),
            payment,
            store_currency,
            notify_webhook_url,
            pending_order_timeout_minutes,
        })
    }
}
