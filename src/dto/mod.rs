use crate::error::{AppError, AppResult};

pub mod cart;
pub mod custom_orders;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settings;
pub mod workshops;

/// Guest-facing contact details must carry a plausible email and a name.
pub(crate) fn validate_contact(email: &str, name: &str) -> AppResult<()> {
    let email = email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(())
}
