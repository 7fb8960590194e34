use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::custom_orders::{CreateCustomOrderRequest, CustomOrderList, CustomOrderPayment},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CustomOrder,
    response::ApiResponse,
    routes::params::PageQuery,
    services::custom_order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_custom_orders).post(create_custom_order))
        .route("/{id}/approve", post(approve_quote))
        .route("/{id}/payment", post(create_payment))
}

#[utoipa::path(
    post,
    path = "/api/custom-orders",
    request_body = CreateCustomOrderRequest,
    responses(
        (status = 201, description = "Request received, awaiting a quote", body = ApiResponse<CustomOrder>),
        (status = 400, description = "Invalid request"),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Custom Orders"
)]
pub async fn create_custom_order(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<CreateCustomOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomOrder>>)> {
    let resp = custom_order_service::create_custom_order(&state, user.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/custom-orders",
    params(PageQuery),
    responses(
        (status = 200, description = "Custom orders of the current customer", body = ApiResponse<CustomOrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Orders"
)]
pub async fn list_my_custom_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<CustomOrderList>>> {
    let resp = custom_order_service::list_my_custom_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/custom-orders/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Custom order ID")
    ),
    responses(
        (status = 200, description = "Quote accepted", body = ApiResponse<CustomOrder>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "No quote to approve"),
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Orders"
)]
pub async fn approve_quote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomOrder>>> {
    let resp = custom_order_service::approve_quote(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/custom-orders/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Custom order ID")
    ),
    responses(
        (status = 200, description = "Payment intent for the quoted price", body = ApiResponse<CustomOrderPayment>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Quote not approved"),
        (status = 502, description = "Payment gateway unavailable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Custom Orders"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomOrderPayment>>> {
    let resp = custom_order_service::create_payment(&state, &user, id).await?;
    Ok(Json(resp))
}
