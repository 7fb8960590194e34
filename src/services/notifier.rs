//! Customer notifications sent after a transaction commits.
//!
//! Delivery is best effort: a failed send is logged and dropped, and never
//! reaches back into the request that caused it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Recipient {
    User(Uuid),
    Email(String),
}

impl Recipient {
    /// Prefer the account when there is one, fall back to the contact email.
    pub fn for_customer(user_id: Option<Uuid>, email: &str) -> Self {
        match user_id {
            Some(id) => Recipient::User(id),
            None => Recipient::Email(email.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    OrderConfirmed,
    OrderStatusChanged,
    OrderCancelled,
    WorkshopBooked,
    WorkshopRescheduled,
    CustomOrderReceived,
    CustomOrderQuoted,
    CustomOrderStatusChanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub event: NotificationEvent,
    pub payload: Value,
}

impl Notification {
    pub fn new(recipient: Recipient, event: NotificationEvent, payload: Value) -> Self {
        Self {
            recipient,
            event,
            payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

pub fn from_config(webhook_url: Option<&str>) -> Arc<dyn Notifier> {
    match webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)),
        None => Arc::new(LogNotifier),
    }
}

/// Spawn delivery of `notifications`; call only once the owning transaction committed.
pub fn dispatch_after_commit(
    notifier: Arc<dyn Notifier>,
    notifications: Vec<Notification>,
) -> Option<JoinHandle<()>> {
    if notifications.is_empty() {
        return None;
    }
    Some(tokio::spawn(async move {
        for notification in notifications {
            let event = notification.event;
            if let Err(err) = notifier.notify(notification).await {
                tracing::warn!(error = %err, event = ?event, "notification dropped");
            }
        }
    }))
}

/// Posts notifications as JSON to the relay that fans them out (email, socket).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "relay answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            event = ?notification.event,
            recipient = ?notification.recipient,
            payload = %notification.payload,
            "notification"
        );
        Ok(())
    }
}
