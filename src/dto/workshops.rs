use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::orders::PaymentIntent,
    error::{AppError, AppResult},
    models::{Workshop, WorkshopRegistration, WorkshopSession},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BookSessionRequest {
    /// Required for guests; defaults to the signed-in customer.
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub registration: WorkshopRegistration,
    pub session: WorkshopSession,
    pub payment: Option<PaymentIntent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RescheduleResponse {
    pub registration: WorkshopRegistration,
    pub from_session: WorkshopSession,
    pub to_session: WorkshopSession,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkshopDetail {
    pub workshop: Workshop,
    pub sessions: Vec<WorkshopSession>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkshopList {
    pub items: Vec<Workshop>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationList {
    pub items: Vec<WorkshopRegistration>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkshopRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_minutes: i32,
}

impl CreateWorkshopRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() || self.slug.trim().is_empty() {
            return Err(AppError::BadRequest("title and slug are required".into()));
        }
        if self.price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        if self.duration_minutes <= 0 {
            return Err(AppError::BadRequest("duration must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub starts_at: DateTime<Utc>,
    pub spots_total: i32,
}

impl CreateSessionRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> AppResult<()> {
        if self.spots_total <= 0 {
            return Err(AppError::BadRequest("spots_total must be positive".into()));
        }
        if self.starts_at <= now {
            return Err(AppError::BadRequest("session must start in the future".into()));
        }
        Ok(())
    }
}
