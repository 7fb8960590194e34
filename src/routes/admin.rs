use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        custom_orders::{CustomOrderList, QuoteCustomOrderRequest, UpdateCustomOrderStatusRequest},
        orders::{OrderList, OrderWithItems, SweepReport, UpdateOrderStatusRequest},
        products::{CreateProductRequest, InventoryAdjustRequest, ProductList},
        settings::UpdateSettingsRequest,
        workshops::{CreateSessionRequest, CreateWorkshopRequest, RegistrationList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CustomOrder, Order, Product, StoreSettings, Workshop, WorkshopSession},
    response::ApiResponse,
    routes::params::{CustomOrderListQuery, LowStockQuery, OrderListQuery},
    services::{admin_service, catalog, custom_order_service, inventory, settings_service, workshop_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/sweep", post(sweep_pending_orders))
        .route("/orders/{id}", get(get_order_admin).delete(delete_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/products", post(create_product))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
        .route("/settings", put(update_settings))
        .route("/workshops", post(create_workshop))
        .route("/workshops/{id}/sessions", post(create_session))
        .route("/workshops/sessions/{id}/registrations", get(list_session_registrations))
        .route("/custom-orders", get(list_custom_orders))
        .route("/custom-orders/{id}/quote", post(quote_custom_order))
        .route("/custom-orders/{id}/status", patch(update_custom_order_status))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Get any order with items (admin only)", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status set; cancelling restores reserved stock", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Cancelled orders cannot be reopened"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order removed", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/sweep",
    responses(
        (status = 200, description = "Cancel unpaid orders past the payment window", body = ApiResponse<SweepReport>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn sweep_pending_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SweepReport>>> {
    let resp = admin_service::run_sweep(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = catalog::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "List low stock products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = inventory::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Adjust inventory", body = ApiResponse<Product>),
        (status = 400, description = "Invalid adjustment"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = inventory::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Shipping and tax settings replaced", body = ApiResponse<StoreSettings>),
        (status = 400, description = "Invalid settings"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<StoreSettings>>> {
    let resp = settings_service::update_settings(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/workshops",
    request_body = CreateWorkshopRequest,
    responses(
        (status = 201, description = "Create workshop", body = ApiResponse<Workshop>),
        (status = 400, description = "Invalid workshop"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_workshop(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateWorkshopRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Workshop>>)> {
    let resp = workshop_service::create_workshop(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/admin/workshops/{id}/sessions",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Schedule a session", body = ApiResponse<WorkshopSession>),
        (status = 400, description = "Invalid session"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Workshop not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<WorkshopSession>>)> {
    let resp = workshop_service::create_session(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/admin/workshops/sessions/{id}/registrations",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Attendee list", body = ApiResponse<RegistrationList>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Session not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_session_registrations(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RegistrationList>>> {
    let resp = workshop_service::list_session_registrations(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/custom-orders",
    params(CustomOrderListQuery),
    responses(
        (status = 200, description = "All custom orders", body = ApiResponse<CustomOrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_custom_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CustomOrderListQuery>,
) -> AppResult<Json<ApiResponse<CustomOrderList>>> {
    let resp = custom_order_service::list_all_custom_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/custom-orders/{id}/quote",
    params(
        ("id" = Uuid, Path, description = "Custom order ID")
    ),
    request_body = QuoteCustomOrderRequest,
    responses(
        (status = 200, description = "Quote sent to the customer", body = ApiResponse<CustomOrder>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is past quoting"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn quote_custom_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuoteCustomOrderRequest>,
) -> AppResult<Json<ApiResponse<CustomOrder>>> {
    let resp = custom_order_service::quote_custom_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/custom-orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Custom order ID")
    ),
    request_body = UpdateCustomOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<CustomOrder>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_custom_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<CustomOrder>>> {
    let resp = custom_order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
