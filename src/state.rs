use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_pool, orm_from_pool},
    services::{
        gateway::{self, PaymentGateway},
        notifier::{self, Notifier},
    },
};

/// Everything a request needs, built once at startup and cloned into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url).await?;
        let gateway = gateway::from_config(&config.payment);
        let notifier = notifier::from_config(config.notify_webhook_url.as_deref());
        Ok(Self::from_parts(pool, config, gateway, notifier))
    }

    pub fn from_parts(
        pool: DbPool,
        config: AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            gateway,
            notifier,
        }
    }

    /// Close pooled connections; called once the server has drained.
    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}
