use secrecy::ExposeSecret;
use tracing::{error, instrument, warn};

use crate::{
    dto::payments::{PaymentVerification, VerifyPaymentRequest},
    error::{AppError, AppResult},
    response::ApiResponse,
    services::{custom_order_service, gateway::verify_payment_signature, order_service, workshop_service},
    state::AppState,
};

/// Check the gateway signature, then settle whichever record owns the gateway order.
///
/// Lookup order: product order, workshop registration, custom order.
#[instrument(skip_all, fields(gateway_order_id = %payload.gateway_order_id, payment_id = %payload.payment_id))]
pub async fn verify_payment(
    state: &AppState,
    payload: VerifyPaymentRequest,
) -> AppResult<ApiResponse<PaymentVerification>> {
    payload.validate()?;
    let gateway_order_id = payload.gateway_order_id.trim();
    let payment_id = payload.payment_id.trim();

    let valid = verify_payment_signature(
        state.config.payment.key_secret.expose_secret(),
        gateway_order_id,
        payment_id,
        &payload.signature,
    );
    if !valid {
        warn!("payment signature rejected");
        return Err(AppError::SignatureMismatch);
    }

    let verification = match order_service::confirm_payment(state, gateway_order_id, payment_id).await? {
        Some(found) => found,
        None => match workshop_service::confirm_payment(state, gateway_order_id, payment_id).await? {
            Some(found) => found,
            None => custom_order_service::confirm_payment(state, gateway_order_id, payment_id)
                .await?
                .ok_or_else(|| {
                    error!("signed payment matches no local record");
                    AppError::GatewayOrderNotFound(gateway_order_id.to_string())
                })?,
        },
    };

    let message = if verification.already_confirmed {
        "Payment already verified"
    } else {
        "Payment verified"
    };
    Ok(ApiResponse::item(message, verification))
}
