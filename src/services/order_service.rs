//! Order creation and the customer-facing side of the order ledger.
//!
//! Stock is reserved when an order is created and stays with the order
//! until it ships or is cancelled. Payment confirmation never moves stock.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::LockType,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::{
        orders::{
            CheckoutResponse, CreateOrderRequest, LineItemRequest, OrderList, OrderWithItems,
            PaymentIntent, QuoteRequest, QuoteResponse, normalize_line_items,
        },
        payments::{PaymentTarget, PaymentVerification},
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, PaymentStatus, StoreSettings},
    response::ApiResponse,
    routes::params::{OrderListQuery, SortOrder},
    services::{
        catalog::{self, ProductSnapshot},
        gateway::CreateGatewayOrder,
        inventory,
        notifier::{Notification, NotificationEvent, Recipient, dispatch_after_commit},
        pricing::{self, Quote},
        settings_service,
    },
    state::AppState,
};

/// `ORD-YYYYMMDD-XXXXXXXX`, the suffix taken from the order id.
pub fn order_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let simple = order_id.simple().to_string().to_uppercase();
    format!("ORD-{}-{}", date, &simple[..8])
}

fn price(items: &[LineItemRequest], snapshots: &[ProductSnapshot], settings: &StoreSettings) -> Quote {
    pricing::calculate(&catalog::priced_lines(items, snapshots), settings, 0)
}

fn product_ids(items: &[LineItemRequest]) -> Vec<Uuid> {
    items.iter().map(|item| item.product_id).collect()
}

/// Price a prospective basket against live catalog values without reserving anything.
pub async fn quote(state: &AppState, payload: QuoteRequest) -> AppResult<ApiResponse<QuoteResponse>> {
    let items = normalize_line_items(&payload.items)?;
    let settings = settings_service::get_or_create(&state.orm, &state.config.store_currency).await?;
    let snapshots = catalog::load_snapshots(&state.orm, &product_ids(&items), false).await?;
    catalog::ensure_stock(&items, &snapshots)?;

    let quote = price(&items, &snapshots, &settings);
    Ok(ApiResponse::item("Quote", QuoteResponse { quote }))
}

#[instrument(skip_all, fields(user_id = ?user.map(|u| u.user_id)))]
pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let items = normalize_line_items(&payload.items)?;
    payload.validate_address()?;
    let (email, name) = payload.resolve_contact(user.and_then(|u| u.email.as_deref()))?;
    let shipping_address = serde_json::to_value(&payload.shipping_address).map_err(anyhow::Error::from)?;

    let settings = settings_service::get_or_create(&state.orm, &state.config.store_currency).await?;
    let ids = product_ids(&items);

    let snapshots = catalog::load_snapshots(&state.orm, &ids, false).await?;
    catalog::ensure_stock(&items, &snapshots)?;
    let quoted = price(&items, &snapshots, &settings);

    let order_id = Uuid::new_v4();
    let number = order_number(order_id);

    // Network call stays outside the transaction so no row lock waits on the gateway.
    let intent = state
        .gateway
        .create_order(CreateGatewayOrder {
            amount: quoted.total,
            currency: settings.currency.clone(),
            receipt: number.clone(),
        })
        .await?;

    let draft = OrderDraft {
        id: order_id,
        number: number.clone(),
        user_id: user.map(|u| u.user_id),
        email,
        name,
        shipping_address,
        notes: payload.notes,
        gateway_order_id: intent.id.clone(),
    };
    let (order, order_items) = match place_order(state, &draft, &items, &settings, &quoted).await {
        Ok(placed) => placed,
        Err(err) => {
            // The unused intent expires on the provider side.
            warn!(gateway_order_id = %intent.id, order_number = %number, error = %err, "order not placed, gateway intent abandoned");
            return Err(err);
        }
    };

    info!(order_id = %order.id, order_number = %order.order_number, total = order.total, "order placed");
    audit::record(
        &state.pool,
        AuditEntry::new(
            user.map(|u| u.user_id),
            "order_create",
            "orders",
            json!({ "order_id": order.id, "total": order.total }),
        ),
    )
    .await;

    let payment = PaymentIntent {
        gateway_order_id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
        key_id: state.gateway.key_id().map(str::to_string),
    };
    Ok(ApiResponse::item(
        "Order created",
        CheckoutResponse {
            order: Order::from(order),
            items: order_items,
            payment,
        },
    ))
}

/// Header fields fixed before the stock transaction starts.
struct OrderDraft {
    id: Uuid,
    number: String,
    user_id: Option<Uuid>,
    email: String,
    name: String,
    shipping_address: serde_json::Value,
    notes: Option<String>,
    gateway_order_id: String,
}

/// Lock, re-check, re-price, insert and reserve in one transaction.
async fn place_order(
    state: &AppState,
    draft: &OrderDraft,
    items: &[LineItemRequest],
    settings: &StoreSettings,
    quoted: &Quote,
) -> AppResult<(OrderModel, Vec<OrderItem>)> {
    let txn = state.orm.begin().await?;

    let locked = catalog::load_snapshots(&txn, &product_ids(items), true).await?;
    catalog::ensure_stock(items, &locked)?;
    let repriced = price(items, &locked, settings);
    if repriced != *quoted {
        warn!(
            order_number = %draft.number,
            quoted = quoted.total,
            current = repriced.total,
            "price moved during checkout"
        );
        return Err(AppError::PriceChanged);
    }

    let order = OrderActive {
        id: Set(draft.id),
        order_number: Set(draft.number.clone()),
        user_id: Set(draft.user_id),
        customer_email: Set(draft.email.clone()),
        customer_name: Set(draft.name.clone()),
        shipping_address: Set(draft.shipping_address.clone()),
        subtotal: Set(repriced.subtotal),
        tax: Set(repriced.tax),
        shipping_cost: Set(repriced.shipping_cost),
        discount: Set(repriced.discount),
        total: Set(repriced.total),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        gateway_order_id: Set(Some(draft.gateway_order_id.clone())),
        payment_id: Set(None),
        notes: Set(draft.notes.clone()),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(items.len());
    for (item, snapshot) in items.iter().zip(&locked) {
        let line = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(snapshot.id),
            product_name: Set(snapshot.name.clone()),
            product_slug: Set(snapshot.slug.clone()),
            image_url: Set(snapshot.image_url.clone()),
            unit_price: Set(snapshot.price),
            quantity: Set(item.quantity),
            weight_grams: Set(snapshot.weight_grams),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(line));
    }

    inventory::reserve(&txn, items, &locked).await?;
    txn.commit().await?;
    Ok((order, order_items))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
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

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|order| user.can_access(order.user_id))
        .ok_or(AppError::NotFound)?;

    let detail = with_items(state, order).await?;
    Ok(ApiResponse::item("Order", detail))
}

pub(crate) async fn with_items(
    state: &AppState,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();
    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

/// Mark the order behind `gateway_order_id` as paid.
///
/// Returns `None` when no order carries that gateway id. Side effects are
/// keyed off the status read under the row lock, so a repeated verification
/// is a no-op.
#[instrument(skip(state))]
pub(crate) async fn confirm_payment(
    state: &AppState,
    gateway_order_id: &str,
    payment_id: &str,
) -> AppResult<Option<PaymentVerification>> {
    let txn = state.orm.begin().await?;
    let Some(order) = Orders::find()
        .filter(OrderCol::GatewayOrderId.eq(gateway_order_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
    else {
        return Ok(None);
    };

    match order.status {
        OrderStatus::Pending => {}
        OrderStatus::Cancelled => {
            error!(
                order_id = %order.id,
                gateway_order_id,
                payment_id,
                "payment captured for a cancelled order, refund required"
            );
            return Err(AppError::OrderNotPayable(order.id));
        }
        _ => {
            return Ok(Some(PaymentVerification {
                target: PaymentTarget::Order,
                id: order.id,
                already_confirmed: true,
            }));
        }
    }

    let now = Utc::now();
    let user_id = order.user_id;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Confirmed);
    active.payment_status = Set(PaymentStatus::Paid);
    active.payment_id = Set(Some(payment_id.to_string()));
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    if let Some(user_id) = user_id {
        CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    info!(order_id = %order.id, "order confirmed");
    dispatch_after_commit(
        state.notifier.clone(),
        vec![Notification::new(
            Recipient::for_customer(order.user_id, &order.customer_email),
            NotificationEvent::OrderConfirmed,
            json!({
                "order_id": order.id,
                "order_number": order.order_number,
                "total": order.total,
            }),
        )],
    );
    audit::record(
        &state.pool,
        AuditEntry::new(
            order.user_id,
            "order_paid",
            "orders",
            json!({ "order_id": order.id, "payment_id": payment_id }),
        ),
    )
    .await;

    Ok(Some(PaymentVerification {
        target: PaymentTarget::Order,
        id: order.id,
        already_confirmed: false,
    }))
}
