use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        requested: i32,
        available: i32,
    },

    #[error("Prices changed while placing the order, please review and retry")]
    PriceChanged,

    #[error("Session is sold out")]
    SoldOut,

    #[error("Already registered for this session")]
    DuplicateBooking,

    #[error("Registration has already been rescheduled once")]
    AlreadyRescheduled,

    #[error("Rescheduling closes 48 hours before the session starts")]
    RescheduleWindowClosed,

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order {0} can no longer be paid")]
    OrderNotPayable(Uuid),

    #[error("Payment signature mismatch")]
    SignatureMismatch,

    #[error("No record matches gateway order {0}")]
    GatewayOrderNotFound(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InsufficientStock { .. }
            | AppError::PriceChanged
            | AppError::SoldOut
            | AppError::DuplicateBooking
            | AppError::AlreadyRescheduled
            | AppError::InvalidTransition { .. }
            | AppError::OrderNotPayable(_) => StatusCode::CONFLICT,
            AppError::RescheduleWindowClosed => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SignatureMismatch => StatusCode::BAD_REQUEST,
            AppError::GatewayOrderNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Conditions the customer can act on (retry, pick another item or session).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            AppError::InsufficientStock { .. }
                | AppError::PriceChanged
                | AppError::SoldOut
                | AppError::DuplicateBooking
                | AppError::AlreadyRescheduled
                | AppError::RescheduleWindowClosed
        )
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<Uuid>,
    retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let product_id = match &self {
            AppError::InsufficientStock { product_id, .. } => Some(*product_id),
            AppError::ProductNotFound(id) => Some(*id),
            _ => None,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                product_id,
                retryable: self.is_user_actionable(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
