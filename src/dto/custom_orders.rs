use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::orders::PaymentIntent,
    error::{AppError, AppResult},
    models::{CustomOrder, CustomOrderStatus},
};

const MAX_REFERENCE_IMAGES: usize = 10;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomOrderRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub description: String,
    #[serde(default)]
    pub reference_images: Vec<String>,
    pub budget: Option<i64>,
}

impl CreateCustomOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.description.trim().len() < 10 {
            return Err(AppError::BadRequest(
                "please describe the piece in at least 10 characters".into(),
            ));
        }
        if self.reference_images.len() > MAX_REFERENCE_IMAGES {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_REFERENCE_IMAGES} reference images"
            )));
        }
        if self
            .reference_images
            .iter()
            .any(|url| !(url.starts_with("https://") || url.starts_with("http://")))
        {
            return Err(AppError::BadRequest("reference images must be URLs".into()));
        }
        if self.budget.is_some_and(|b| b <= 0) {
            return Err(AppError::BadRequest("budget must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteCustomOrderRequest {
    pub price: i64,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomOrderStatusRequest {
    pub status: CustomOrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomOrderList {
    pub items: Vec<CustomOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomOrderPayment {
    pub custom_order: CustomOrder,
    pub payment: PaymentIntent,
}
