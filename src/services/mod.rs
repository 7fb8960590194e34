pub mod admin_service;
pub mod cart_service;
pub mod catalog;
pub mod custom_order_service;
pub mod gateway;
pub mod inventory;
pub mod notifier;
pub mod order_service;
pub mod payment;
pub mod pricing;
pub mod settings_service;
pub mod sweep;
pub mod workshop_service;
