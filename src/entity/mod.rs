pub mod audit_logs;
pub mod cart_items;
pub mod custom_orders;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod store_settings;
pub mod workshop_registrations;
pub mod workshop_sessions;
pub mod workshops;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use custom_orders::Entity as CustomOrders;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use store_settings::Entity as StoreSettings;
pub use workshop_registrations::Entity as WorkshopRegistrations;
pub use workshop_sessions::Entity as WorkshopSessions;
pub use workshops::Entity as Workshops;
