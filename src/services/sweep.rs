//! Cancels checkouts that were never paid and puts their stock back.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, sea_query::LockType,
};
use serde_json::json;
use tracing::{error, info, instrument};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    dto::orders::SweepReport,
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    error::AppResult,
    models::{OrderStatus, PaymentStatus},
    services::{
        inventory,
        notifier::{Notification, NotificationEvent, Recipient, dispatch_after_commit},
    },
    state::AppState,
};

const EXPIRED_NOTE: &str = "Cancelled automatically: payment not received in time";

/// Report plus the spawned delivery of cancellation notices.
pub struct SweepOutcome {
    pub report: SweepReport,
    pub notifications: Option<JoinHandle<()>>,
}

/// Cancel every unpaid `PENDING` order created before `now - timeout`.
pub async fn sweep_expired_orders(state: &AppState, now: DateTime<Utc>) -> AppResult<SweepReport> {
    Ok(run(state, now).await?.report)
}

/// Like [`sweep_expired_orders`], but hands back the notification task so
/// short-lived callers can wait for delivery.
///
/// Each order gets its own transaction; a failure is logged, recorded in the
/// report and the sweep moves on.
#[instrument(skip(state))]
pub async fn run(state: &AppState, now: DateTime<Utc>) -> AppResult<SweepOutcome> {
    let cutoff = now - Duration::minutes(state.config.pending_order_timeout_minutes);
    let candidates: Vec<Uuid> = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .filter(OrderCol::PaymentStatus.eq(PaymentStatus::Pending))
        .filter(OrderCol::CreatedAt.lt(cutoff))
        .order_by_asc(OrderCol::CreatedAt)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let mut report = SweepReport::default();
    let mut notifications = Vec::new();
    for order_id in candidates {
        match cancel_expired(state, order_id).await {
            Ok(Some((order, restored))) => {
                report.cancelled.push(order.id);
                report.units_restored += restored;
                notifications.push(Notification::new(
                    Recipient::for_customer(order.user_id, &order.customer_email),
                    NotificationEvent::OrderCancelled,
                    json!({
                        "order_id": order.id,
                        "order_number": order.order_number,
                        "reason": "payment_timeout",
                    }),
                ));
            }
            // Paid or cancelled between the scan and the lock.
            Ok(None) => {}
            Err(err) => {
                error!(order_id = %order_id, error = %err, "failed to cancel expired order");
                report.failed.push(order_id);
            }
        }
    }

    info!(
        cancelled = report.cancelled.len(),
        units_restored = report.units_restored,
        failed = report.failed.len(),
        "pending order sweep finished"
    );
    let notifications = dispatch_after_commit(state.notifier.clone(), notifications);
    Ok(SweepOutcome {
        report,
        notifications,
    })
}

async fn cancel_expired(state: &AppState, order_id: Uuid) -> AppResult<Option<(OrderModel, i64)>> {
    let txn = state.orm.begin().await?;
    let Some(order) = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
    else {
        return Ok(None);
    };
    if order.status != OrderStatus::Pending || order.payment_status != PaymentStatus::Pending {
        return Ok(None);
    }

    let restored = inventory::restore(&txn, order.id).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled);
    active.payment_status = Set(PaymentStatus::Failed);
    active.notes = Set(Some(EXPIRED_NOTE.to_string()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    info!(order_id = %order.id, units_restored = restored, "expired order cancelled");
    Ok(Some((order, restored)))
}
