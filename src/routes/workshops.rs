use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::workshops::{
        BookSessionRequest, BookingResponse, RegistrationList, RescheduleRequest, RescheduleResponse,
        WorkshopDetail, WorkshopList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::PageQuery,
    services::workshop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workshops))
        .route("/registrations", get(my_registrations))
        .route("/registrations/{id}/reschedule", post(reschedule))
        .route("/sessions/{id}/book", post(book_session))
        .route("/{slug}", get(get_workshop))
}

#[utoipa::path(
    get,
    path = "/api/workshops",
    params(PageQuery),
    responses(
        (status = 200, description = "List workshops", body = ApiResponse<WorkshopList>)
    ),
    tag = "Workshops"
)]
pub async fn list_workshops(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<WorkshopList>>> {
    let resp = workshop_service::list_workshops(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/workshops/{slug}",
    params(
        ("slug" = String, Path, description = "Workshop slug")
    ),
    responses(
        (status = 200, description = "Workshop with upcoming sessions", body = ApiResponse<WorkshopDetail>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Workshops"
)]
pub async fn get_workshop(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<WorkshopDetail>>> {
    let resp = workshop_service::get_workshop(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/workshops/sessions/{id}/book",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    request_body = BookSessionRequest,
    responses(
        (status = 201, description = "Spot reserved; paid workshops return a payment intent", body = ApiResponse<BookingResponse>),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Sold out or already registered"),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Workshops"
)]
pub async fn book_session(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookSessionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookingResponse>>)> {
    let resp = workshop_service::book_session(&state, user.as_ref(), id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/workshops/registrations/{id}/reschedule",
    params(
        ("id" = Uuid, Path, description = "Registration ID")
    ),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Registration moved to the new session", body = ApiResponse<RescheduleResponse>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Already rescheduled or destination sold out"),
        (status = 422, description = "Less than 48 hours before the session"),
    ),
    security(("bearer_auth" = [])),
    tag = "Workshops"
)]
pub async fn reschedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> AppResult<Json<ApiResponse<RescheduleResponse>>> {
    let resp = workshop_service::reschedule(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/workshops/registrations",
    responses(
        (status = 200, description = "Registrations of the current customer", body = ApiResponse<RegistrationList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Workshops"
)]
pub async fn my_registrations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RegistrationList>>> {
    let resp = workshop_service::my_registrations(&state, &user).await?;
    Ok(Json(resp))
}
