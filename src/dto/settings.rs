use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub base_shipping_rate: i64,
    pub per_kg_rate: i64,
    pub free_shipping_threshold: i64,
    pub tax_percent: f64,
    pub currency: Option<String>,
}

impl UpdateSettingsRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.base_shipping_rate < 0 || self.per_kg_rate < 0 || self.free_shipping_threshold < 0 {
            return Err(AppError::BadRequest("rates must not be negative".into()));
        }
        if !self.tax_percent.is_finite() || !(0.0..=100.0).contains(&self.tax_percent) {
            return Err(AppError::BadRequest(
                "tax_percent must be between 0 and 100".into(),
            ));
        }
        if let Some(currency) = &self.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(AppError::BadRequest(
                    "currency must be a 3-letter ISO code".into(),
                ));
            }
        }
        Ok(())
    }
}
