use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{response::ApiResponse, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    status: String,
    database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = ApiResponse<HealthData>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    match state.orm.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::item(
                "Health check",
                HealthData {
                    status: "ok".into(),
                    database: "up".into(),
                },
            )),
        ),
        Err(err) => {
            tracing::error!(error = %err, "database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::item(
                    "Health check",
                    HealthData {
                        status: "degraded".into(),
                        database: "down".into(),
                    },
                )),
            )
        }
    }
}
