//! Commissioned pieces, priced by hand and paid once the customer approves the quote.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::LockType,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::{
        custom_orders::{
            CreateCustomOrderRequest, CustomOrderList, CustomOrderPayment, QuoteCustomOrderRequest,
            UpdateCustomOrderStatusRequest,
        },
        orders::PaymentIntent,
        payments::{PaymentTarget, PaymentVerification},
        validate_contact,
    },
    entity::custom_orders::{
        ActiveModel as CustomOrderActive, Column as CustomCol, Entity as CustomOrders,
        Model as CustomOrderModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{CustomOrder, CustomOrderStatus, PaymentStatus},
    response::ApiResponse,
    routes::params::{CustomOrderListQuery, PageQuery},
    services::{
        gateway::CreateGatewayOrder,
        notifier::{Notification, NotificationEvent, Recipient, dispatch_after_commit},
        settings_service,
    },
    state::AppState,
};

fn notification(order: &CustomOrderModel, event: NotificationEvent) -> Notification {
    Notification::new(
        Recipient::for_customer(order.user_id, &order.email),
        event,
        json!({
            "custom_order_id": order.id,
            "status": order.status,
            "quoted_price": order.quoted_price,
            "note": order.admin_note,
        }),
    )
}

pub async fn create_custom_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateCustomOrderRequest,
) -> AppResult<ApiResponse<CustomOrder>> {
    payload.validate()?;
    let email = payload
        .email
        .as_deref()
        .or(user.and_then(|u| u.email.as_deref()))
        .ok_or_else(|| AppError::BadRequest("email is required".into()))?
        .trim()
        .to_lowercase();
    let name = payload.name.as_deref().unwrap_or_default().trim().to_string();
    validate_contact(&email, &name)?;

    let order = CustomOrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.map(|u| u.user_id)),
        name: Set(name),
        email: Set(email),
        description: Set(payload.description.trim().to_string()),
        reference_images: Set(json!(payload.reference_images)),
        budget: Set(payload.budget),
        quoted_price: Set(None),
        admin_note: Set(None),
        status: Set(CustomOrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        gateway_order_id: Set(None),
        payment_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    info!(custom_order_id = %order.id, "custom order received");
    dispatch_after_commit(
        state.notifier.clone(),
        vec![notification(&order, NotificationEvent::CustomOrderReceived)],
    );
    Ok(ApiResponse::item("Custom order received", CustomOrder::from(order)))
}

pub async fn list_my_custom_orders(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<CustomOrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = CustomOrders::find()
        .filter(CustomCol::UserId.eq(user.user_id))
        .order_by_desc(CustomCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CustomOrder::from)
        .collect();
    Ok(ApiResponse::page("Custom orders", CustomOrderList { items }, page, limit, total))
}

pub async fn list_all_custom_orders(
    state: &AppState,
    user: &AuthUser,
    query: CustomOrderListQuery,
) -> AppResult<ApiResponse<CustomOrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(CustomCol::Status.eq(status));
    }
    let finder = CustomOrders::find()
        .filter(condition)
        .order_by_desc(CustomCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CustomOrder::from)
        .collect();
    Ok(ApiResponse::page("Custom orders", CustomOrderList { items }, page, limit, total))
}

/// Lock the row and check the move against the lifecycle table.
async fn transition(
    txn: &sea_orm::DatabaseTransaction,
    id: Uuid,
    next: CustomOrderStatus,
    owner: Option<&AuthUser>,
) -> AppResult<CustomOrderModel> {
    let order = CustomOrders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .filter(|order| owner.is_none_or(|user| user.can_access(order.user_id)))
        .ok_or(AppError::NotFound)?;
    if !order.status.can_transition_to(next) {
        return Err(AppError::invalid_transition(order.status, next));
    }
    Ok(order)
}

#[instrument(skip(state, user, payload), fields(admin_id = %user.user_id))]
pub async fn quote_custom_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: QuoteCustomOrderRequest,
) -> AppResult<ApiResponse<CustomOrder>> {
    ensure_admin(user)?;
    if payload.price <= 0 {
        return Err(AppError::BadRequest("quoted price must be positive".into()));
    }

    let txn = state.orm.begin().await?;
    let order = transition(&txn, id, CustomOrderStatus::Quoted, None).await?;
    let mut active: CustomOrderActive = order.into();
    active.status = Set(CustomOrderStatus::Quoted);
    active.quoted_price = Set(Some(payload.price));
    active.admin_note = Set(payload.note.filter(|note| !note.trim().is_empty()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    info!(custom_order_id = %order.id, price = payload.price, "custom order quoted");
    dispatch_after_commit(
        state.notifier.clone(),
        vec![notification(&order, NotificationEvent::CustomOrderQuoted)],
    );
    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "custom_order_quote",
            "custom_orders",
            json!({ "custom_order_id": order.id, "price": payload.price }),
        ),
    )
    .await;
    Ok(ApiResponse::item("Quote sent", CustomOrder::from(order)))
}

pub async fn approve_quote(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CustomOrder>> {
    let txn = state.orm.begin().await?;
    let order = transition(&txn, id, CustomOrderStatus::Approved, Some(user)).await?;
    let mut active: CustomOrderActive = order.into();
    active.status = Set(CustomOrderStatus::Approved);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    info!(custom_order_id = %order.id, "custom order quote approved");
    Ok(ApiResponse::item("Quote approved", CustomOrder::from(order)))
}

/// Open a gateway payment for an approved quote. Calling it again issues a fresh intent.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CustomOrderPayment>> {
    let order = CustomOrders::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|order| user.can_access(order.user_id))
        .ok_or(AppError::NotFound)?;
    if order.status != CustomOrderStatus::Approved {
        return Err(AppError::invalid_transition(order.status, CustomOrderStatus::Paid));
    }
    let amount = order
        .quoted_price
        .ok_or_else(|| AppError::BadRequest("custom order has no quoted price".into()))?;

    let settings = settings_service::get_or_create(&state.orm, &state.config.store_currency).await?;
    let intent = state
        .gateway
        .create_order(CreateGatewayOrder {
            amount,
            currency: settings.currency,
            receipt: format!("CO-{}", &order.id.simple().to_string()[..8].to_uppercase()),
        })
        .await?;

    let txn = state.orm.begin().await?;
    let order = CustomOrders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.status != CustomOrderStatus::Approved || order.quoted_price != Some(amount) {
        return Err(AppError::invalid_transition(order.status, CustomOrderStatus::Paid));
    }
    let mut active: CustomOrderActive = order.into();
    active.gateway_order_id = Set(Some(intent.id.clone()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::item(
        "Payment created",
        CustomOrderPayment {
            custom_order: CustomOrder::from(order),
            payment: PaymentIntent {
                gateway_order_id: intent.id,
                amount: intent.amount,
                currency: intent.currency,
                key_id: state.gateway.key_id().map(str::to_string),
            },
        },
    ))
}

/// `APPROVED -> PAID` for the custom order behind `gateway_order_id`.
#[instrument(skip(state))]
pub(crate) async fn confirm_payment(
    state: &AppState,
    gateway_order_id: &str,
    payment_id: &str,
) -> AppResult<Option<PaymentVerification>> {
    let txn = state.orm.begin().await?;
    let Some(order) = CustomOrders::find()
        .filter(CustomCol::GatewayOrderId.eq(gateway_order_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
    else {
        return Ok(None);
    };

    if order.status.is_paid() {
        return Ok(Some(PaymentVerification {
            target: PaymentTarget::CustomOrder,
            id: order.id,
            already_confirmed: true,
        }));
    }
    if order.status != CustomOrderStatus::Approved {
        tracing::error!(
            custom_order_id = %order.id,
            status = %order.status,
            gateway_order_id,
            "payment captured for a custom order that is not awaiting payment"
        );
        return Err(AppError::invalid_transition(order.status, CustomOrderStatus::Paid));
    }

    let mut active: CustomOrderActive = order.into();
    active.status = Set(CustomOrderStatus::Paid);
    active.payment_status = Set(PaymentStatus::Paid);
    active.payment_id = Set(Some(payment_id.to_string()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    info!(custom_order_id = %order.id, "custom order paid");
    dispatch_after_commit(
        state.notifier.clone(),
        vec![notification(&order, NotificationEvent::CustomOrderStatusChanged)],
    );

    Ok(Some(PaymentVerification {
        target: PaymentTarget::CustomOrder,
        id: order.id,
        already_confirmed: false,
    }))
}

#[instrument(skip(state, user, payload), fields(admin_id = %user.user_id, status = %payload.status))]
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCustomOrderStatusRequest,
) -> AppResult<ApiResponse<CustomOrder>> {
    ensure_admin(user)?;
    let next = payload.status;
    if matches!(next, CustomOrderStatus::Quoted | CustomOrderStatus::Paid) {
        return Err(AppError::BadRequest(format!(
            "{next} is set by quoting or payment, not directly"
        )));
    }

    let txn = state.orm.begin().await?;
    let order = transition(&txn, id, next, None).await?;
    let previous = order.status;
    let unpaid = order.payment_status == PaymentStatus::Pending;
    let mut active: CustomOrderActive = order.into();
    active.status = Set(next);
    if next == CustomOrderStatus::Cancelled && unpaid {
        active.payment_status = Set(PaymentStatus::Failed);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    info!(custom_order_id = %order.id, from = %previous, to = %next, "custom order status changed");
    dispatch_after_commit(
        state.notifier.clone(),
        vec![notification(&order, NotificationEvent::CustomOrderStatusChanged)],
    );
    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "custom_order_status",
            "custom_orders",
            json!({ "custom_order_id": order.id, "from": previous, "to": next }),
        ),
    )
    .await;
    Ok(ApiResponse::item("Custom order updated", CustomOrder::from(order)))
}
