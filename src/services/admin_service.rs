//! Back-office order management. `update_order_status` is the only place an
//! order's status changes outside of checkout, payment and the timeout sweep.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::LockType,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::orders::{OrderList, OrderWithItems, SweepReport, UpdateOrderStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus, PaymentStatus},
    response::ApiResponse,
    routes::params::{OrderListQuery, SortOrder},
    services::{
        inventory,
        notifier::{Notification, NotificationEvent, Recipient, dispatch_after_commit},
        order_service, sweep,
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::page("Orders", OrderList { items }, page, limit, total))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let detail = order_service::with_items(state, order).await?;
    Ok(ApiResponse::item("Order found", detail))
}

/// Set any status except leaving `CANCELLED` or reopening a shipped order.
///
/// Cancelling an order that still holds reserved stock restores it in the
/// same transaction. One notification per actual change, none for a no-op.
#[instrument(skip(state, user, payload), fields(admin_id = %user.user_id, status = %payload.status))]
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = existing.status;

    if previous == next {
        txn.commit().await?;
        return Ok(ApiResponse::item("Order unchanged", Order::from(existing)));
    }
    if !previous.admin_can_set(next) {
        return Err(AppError::invalid_transition(previous, next));
    }
    if !previous.can_advance_to(next) {
        tracing::warn!(order_id = %id, from = %previous, to = %next, "admin override outside the normal order flow");
    }

    let mut restored = 0;
    if next == OrderStatus::Cancelled && previous.holds_reserved_stock() {
        restored = inventory::restore(&txn, existing.id).await?;
    }

    let unpaid = existing.payment_status == PaymentStatus::Pending;
    let mut active: OrderActive = existing.into();
    active.status = Set(next);
    if next == OrderStatus::Cancelled && unpaid {
        active.payment_status = Set(PaymentStatus::Failed);
    }
    if let Some(note) = payload.note.filter(|note| !note.trim().is_empty()) {
        active.notes = Set(Some(note));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    info!(order_id = %order.id, from = %previous, to = %next, units_restored = restored, "order status changed");
    let event = if next == OrderStatus::Cancelled {
        NotificationEvent::OrderCancelled
    } else {
        NotificationEvent::OrderStatusChanged
    };
    dispatch_after_commit(
        state.notifier.clone(),
        vec![Notification::new(
            Recipient::for_customer(order.user_id, &order.customer_email),
            event,
            json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "from": previous,
                "to": next,
            }),
        )],
    );
    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "order_status_update",
            "orders",
            json!({ "order_id": order.id, "from": previous, "to": next, "units_restored": restored }),
        ),
    )
    .await;

    Ok(ApiResponse::item("Order updated", Order::from(order)))
}

/// Remove an order and its items. Stock still reserved by it goes back on the shelf.
#[instrument(skip(state, user), fields(admin_id = %user.user_id))]
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let restored = if order.status.holds_reserved_stock() {
        inventory::restore(&txn, order.id).await?
    } else {
        0
    };
    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    let order_number = order.order_number.clone();
    order.delete(&txn).await?;
    txn.commit().await?;

    info!(order_id = %id, order_number = %order_number, units_restored = restored, "order deleted");
    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "order_delete",
            "orders",
            json!({ "order_id": id, "order_number": order_number, "units_restored": restored }),
        ),
    )
    .await;

    Ok(ApiResponse::item(
        "Order deleted",
        json!({ "order_id": id, "units_restored": restored }),
    ))
}

pub async fn run_sweep(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SweepReport>> {
    ensure_admin(user)?;
    let report = sweep::sweep_expired_orders(state, Utc::now()).await?;
    Ok(ApiResponse::item("Sweep finished", report))
}
