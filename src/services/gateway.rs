//! Hosted payment gateway client and payment signature checks.
//!
//! The gateway signs a completed checkout as
//! `hex(HMAC-SHA256(order_id + "|" + payment_id, key_secret))`; that scheme is
//! fixed by the provider.

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::{config::PaymentConfig, error::AppError};

type HmacSha256 = Hmac<Sha256>;

/// Gateway amounts are sent in the smallest currency unit (paise, cents).
const MINOR_UNITS: i64 = 100;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Response(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateGatewayOrder {
    /// Amount in whole currency units.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// A not-yet-settled payment intent on the gateway side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: CreateGatewayOrder) -> Result<GatewayOrder, GatewayError>;

    /// Publishable key the browser checkout needs, if any.
    fn key_id(&self) -> Option<&str>;
}

pub fn from_config(config: &PaymentConfig) -> Arc<dyn PaymentGateway> {
    match &config.key_id {
        Some(key_id) => Arc::new(RazorpayGateway::new(
            config.api_base.clone(),
            key_id.clone(),
            config.key_secret.clone(),
        )),
        None => {
            tracing::warn!("PAYMENT_KEY_ID not set, issuing payment handles locally");
            Arc::new(OfflineGateway)
        }
    }
}

/// Signature the gateway attaches to a successful payment.
pub fn sign_payment(secret: &str, gateway_order_id: &str, payment_id: &str) -> Option<String> {
    let mac = payment_mac(secret, gateway_order_id, payment_id)?;
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a client-submitted payment signature.
pub fn verify_payment_signature(
    secret: &str,
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Some(mac) = payment_mac(secret, gateway_order_id, payment_id) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}

fn payment_mac(secret: &str, gateway_order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        error!("payment key secret rejected by HMAC");
        return None;
    };
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

#[derive(Clone)]
pub struct RazorpayGateway {
    client: Client,
    api_base: String,
    key_id: String,
    key_secret: SecretString,
}

impl std::fmt::Debug for RazorpayGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayGateway")
            .field("api_base", &self.api_base)
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
}

impl RazorpayGateway {
    pub fn new(api_base: String, key_id: String, key_secret: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self), fields(receipt = %request.receipt))]
    async fn create_order(&self, request: CreateGatewayOrder) -> Result<GatewayOrder, GatewayError> {
        let body = CreateOrderBody {
            amount: request.amount * MINOR_UNITS,
            currency: &request.currency,
            receipt: &request.receipt,
        };

        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "gateway refused order creation");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Response(e.to_string()))?;

        debug!(gateway_order_id = %created.id, "gateway order created");
        Ok(GatewayOrder {
            id: created.id,
            amount: created.amount / MINOR_UNITS,
            currency: created.currency,
            receipt: created.receipt.unwrap_or(request.receipt),
        })
    }

    fn key_id(&self) -> Option<&str> {
        Some(&self.key_id)
    }
}

/// Issues gateway-shaped handles without a network call. Used in development
/// and tests; payments against it are confirmed by signing with the key secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn create_order(&self, request: CreateGatewayOrder) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt,
        })
    }

    fn key_id(&self) -> Option<&str> {
        None
    }
}
