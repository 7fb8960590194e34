use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Confirmation the hosted checkout hands back to the browser.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

impl VerifyPaymentRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.gateway_order_id.trim().is_empty()
            || self.payment_id.trim().is_empty()
            || self.signature.trim().is_empty()
        {
            return Err(AppError::BadRequest(
                "gateway_order_id, payment_id and signature are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTarget {
    Order,
    WorkshopRegistration,
    CustomOrder,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentVerification {
    pub target: PaymentTarget,
    pub id: Uuid,
    /// True when an earlier verification already settled this payment.
    pub already_confirmed: bool,
}
