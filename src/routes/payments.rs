use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::{PaymentVerification, VerifyPaymentRequest},
    error::AppResult,
    response::ApiResponse,
    services::payment,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/verify", post(verify_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment settled, or already settled earlier", body = ApiResponse<PaymentVerification>),
        (status = 400, description = "Signature mismatch"),
        (status = 404, description = "No order, registration or custom order carries this gateway order id"),
        (status = 409, description = "Target can no longer be paid"),
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentVerification>>> {
    let resp = payment::verify_payment(&state, payload).await?;
    Ok(Json(resp))
}
