#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pottery_commerce_api::{
    config::{AppConfig, PaymentConfig},
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products, Model as ProductModel},
        workshop_sessions::{ActiveModel as SessionActive, Model as SessionModel},
        workshops::{ActiveModel as WorkshopActive, Model as WorkshopModel},
    },
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    models::ShippingAddress,
    services::{
        gateway::{OfflineGateway, sign_payment},
        notifier::{Notification, NotificationEvent, Notifier, NotifyError},
    },
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use uuid::Uuid;

pub const KEY_SECRET: &str = "test_key_secret";

/// Keeps every notification so tests can count deliveries.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.sent().into_iter().map(|n| n.event).collect()
    }

    pub fn count(&self, event: NotificationEvent) -> usize {
        self.events().into_iter().filter(|e| *e == event).count()
    }

    /// Delivery runs on a spawned task; give it a moment to land.
    pub async fn settle(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?
            .push(notification);
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub notifier: RecordingNotifier,
}

/// Connect to the test database, or `None` when none is configured.
///
/// Tests use fresh ids and slugs instead of truncating, so they can run in
/// parallel against the same database.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    let Ok(database_url) =
        std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
    else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
        return Ok(None);
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&orm_from_pool(&pool)).await?;

    let notifier = RecordingNotifier::default();
    let state = AppState::from_parts(
        pool,
        config(database_url),
        Arc::new(OfflineGateway),
        Arc::new(notifier.clone()),
    );
    Ok(Some(TestApp { state, notifier }))
}

fn config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test_jwt_secret".to_string().into(),
        payment: PaymentConfig {
            key_id: None,
            key_secret: KEY_SECRET.to_string().into(),
            api_base: "http://localhost".into(),
        },
        store_currency: "INR".into(),
        notify_webhook_url: None,
        pending_order_timeout_minutes: 30,
    }
}

pub fn customer() -> AuthUser {
    let id = Uuid::new_v4();
    AuthUser {
        user_id: id,
        role: ROLE_CUSTOMER.into(),
        email: Some(format!("{}@example.com", id.simple())),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_ADMIN.into(),
        email: Some("studio@example.com".into()),
    }
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        phone: "+91 98450 00000".into(),
        line1: "12 Potters Lane".into(),
        line2: None,
        city: "Bengaluru".into(),
        state: "KA".into(),
        postal_code: "560001".into(),
        country: "IN".into(),
    }
}

pub fn signature(gateway_order_id: &str, payment_id: &str) -> String {
    sign_payment(KEY_SECRET, gateway_order_id, payment_id).expect("hmac accepts the test secret")
}

pub async fn insert_product(
    state: &AppState,
    price: i64,
    stock: i32,
    weight_grams: i32,
) -> anyhow::Result<ProductModel> {
    let id = Uuid::new_v4();
    let product = ProductActive {
        id: Set(id),
        name: Set(format!("Test Bowl {}", &id.simple().to_string()[..6])),
        slug: Set(format!("test-bowl-{}", id.simple())),
        description: Set(None),
        image_url: Set(None),
        price: Set(price),
        stock: Set(stock),
        weight_grams: Set(weight_grams),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

pub async fn insert_workshop(state: &AppState, price: i64) -> anyhow::Result<WorkshopModel> {
    let id = Uuid::new_v4();
    let workshop = WorkshopActive {
        id: Set(id),
        title: Set("Handbuilding".into()),
        slug: Set(format!("handbuilding-{}", id.simple())),
        description: Set(None),
        price: Set(price),
        duration_minutes: Set(120),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(workshop)
}

pub async fn insert_session(
    state: &AppState,
    workshop_id: Uuid,
    starts_at: DateTime<Utc>,
    spots_total: i32,
) -> anyhow::Result<SessionModel> {
    let session = SessionActive {
        id: Set(Uuid::new_v4()),
        workshop_id: Set(workshop_id),
        starts_at: Set(starts_at.into()),
        spots_total: Set(spots_total),
        spots_booked: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(session)
}
