use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Product,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub weight_grams: i32,
}

impl CreateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() || self.slug.trim().is_empty() {
            return Err(AppError::BadRequest("name and slug are required".into()));
        }
        if self.price < 0 || self.stock < 0 || self.weight_grams < 0 {
            return Err(AppError::BadRequest(
                "price, stock and weight must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
