use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod cart;
pub mod custom_orders;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod settings;
pub mod workshops;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/settings", settings::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/workshops", workshops::router())
        .nest("/custom-orders", custom_orders::router())
        .nest("/admin", admin::router())
}
