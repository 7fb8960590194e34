use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// One row in `audit_logs`.
#[derive(Debug)]
pub struct AuditEntry<'a> {
    pub actor: Option<Uuid>,
    pub action: &'a str,
    pub resource: &'a str,
    pub metadata: Value,
}

impl<'a> AuditEntry<'a> {
    pub fn new(actor: Option<Uuid>, action: &'a str, resource: &'a str, metadata: Value) -> Self {
        Self {
            actor,
            action,
            resource,
            metadata,
        }
    }
}

pub async fn log_audit(pool: &DbPool, entry: &AuditEntry<'_>) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.actor)
    .bind(entry.action)
    .bind(entry.resource)
    .bind(&entry.metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Write an audit entry after a commit. Failures are logged, never returned.
pub async fn record(pool: &DbPool, entry: AuditEntry<'_>) {
    if let Err(err) = log_audit(pool, &entry).await {
        tracing::warn!(error = %err, action = entry.action, "audit log failed");
    }
}
