//! One-shot run of the pending order sweep, meant for cron or a scheduler.

use chrono::Utc;
use pottery_commerce_api::{config::AppConfig, services::sweep, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pottery_commerce_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let state = AppState::init(config).await?;

    let outcome = sweep::run(&state, Utc::now()).await?;
    let report = outcome.report;
    println!(
        "Cancelled {} order(s), restored {} unit(s), {} failure(s)",
        report.cancelled.len(),
        report.units_restored,
        report.failed.len()
    );

    if let Some(delivery) = outcome.notifications {
        if let Err(err) = delivery.await {
            tracing::warn!(error = %err, "notification task failed");
        }
    }
    state.shutdown().await;

    if !report.failed.is_empty() {
        anyhow::bail!("{} order(s) could not be cancelled", report.failed.len());
    }
    Ok(())
}
