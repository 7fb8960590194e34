mod common;

use chrono::{Duration, Utc};
use pottery_commerce_api::{
    dto::{
        orders::{CreateOrderRequest, LineItemRequest},
        payments::VerifyPaymentRequest,
    },
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::AppError,
    models::{OrderStatus, PaymentStatus},
    services::{admin_service, notifier::NotificationEvent, order_service, payment, sweep},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};
use uuid::Uuid;

use common::{address, admin, customer, insert_product, setup, signature, stock_of};

async fn place(state: &AppState, product_id: Uuid, quantity: i32) -> anyhow::Result<(Uuid, String)> {
    let checkout = order_service::create_order(
        state,
        Some(&customer()),
        CreateOrderRequest {
            items: vec![LineItemRequest { product_id, quantity }],
            shipping_address: address(),
            email: None,
            name: None,
            notes: None,
        },
    )
    .await?
    .data
    .expect("checkout data");
    Ok((checkout.order.id, checkout.payment.gateway_order_id))
}

fn verify(gateway_order_id: &str, payment_id: &str) -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        gateway_order_id: gateway_order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: signature(gateway_order_id, payment_id),
    }
}

async fn backdate(state: &AppState, order_id: Uuid, minutes: i64) -> anyhow::Result<()> {
    let created_at = Utc::now() - Duration::minutes(minutes);
    Orders::update_many()
        .col_expr(OrderCol::CreatedAt, Expr::value(created_at))
        .filter(OrderCol::Id.eq(order_id))
        .exec(&state.orm)
        .await?;
    Ok(())
}

// One test per binary: a sweep touches every stale order in the database.
#[tokio::test]
async fn stale_pending_orders_are_cancelled_and_restocked() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let staff = admin();

    let mug = insert_product(state, 1200, 10, 450).await?;
    let (stale, stale_gateway_id) = place(state, mug.id, 3).await?;
    let (young, _) = place(state, mug.id, 2).await?;
    let (paid, paid_gateway_id) = place(state, mug.id, 1).await?;
    let (reopened, reopened_gateway_id) = place(state, mug.id, 1).await?;
    assert_eq!(stock_of(state, mug.id).await?, 3);

    payment::verify_payment(state, verify(&paid_gateway_id, "pay_sweep")).await?;
    payment::verify_payment(state, verify(&reopened_gateway_id, "pay_reopened")).await?;
    // A paid order pushed back to PENDING behind the service's back.
    Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(OrderStatus::Pending.as_str()))
        .filter(OrderCol::Id.eq(reopened))
        .exec(&state.orm)
        .await?;

    backdate(state, stale, 45).await?;
    backdate(state, paid, 45).await?;
    backdate(state, reopened, 45).await?;

    let outcome = sweep::run(state, Utc::now()).await?;
    if let Some(delivery) = outcome.notifications {
        delivery.await?;
    }
    let report = outcome.report;

    assert!(report.cancelled.contains(&stale));
    assert!(!report.cancelled.contains(&young));
    assert!(!report.cancelled.contains(&paid));
    assert!(!report.cancelled.contains(&reopened));
    assert!(!report.failed.contains(&stale));
    // Only the stale order's three mugs go back.
    assert_eq!(stock_of(state, mug.id).await?, 6);

    let stale_order = admin_service::get_order_admin(state, &staff, stale).await?.data.expect("order");
    assert_eq!(stale_order.order.status, OrderStatus::Cancelled);
    assert_eq!(stale_order.order.payment_status, PaymentStatus::Failed);
    assert!(stale_order.order.notes.is_some());

    let young_order = admin_service::get_order_admin(state, &staff, young).await?.data.expect("order");
    assert_eq!(young_order.order.status, OrderStatus::Pending);
    let paid_order = admin_service::get_order_admin(state, &staff, paid).await?.data.expect("order");
    assert_eq!(paid_order.order.status, OrderStatus::Confirmed);
    let reopened_order = admin_service::get_order_admin(state, &staff, reopened).await?.data.expect("order");
    assert_eq!(reopened_order.order.status, OrderStatus::Pending);
    assert_eq!(reopened_order.order.payment_status, PaymentStatus::Paid);

    let cancelled_notices = app
        .notifier
        .sent()
        .into_iter()
        .filter(|n| n.event == NotificationEvent::OrderCancelled)
        .filter(|n| n.payload["order_id"] == serde_json::json!(stale))
        .count();
    assert_eq!(cancelled_notices, 1);

    // A payment that lands after the sweep is refused and moves no stock.
    let err = payment::verify_payment(state, verify(&stale_gateway_id, "pay_late"))
        .await
        .expect_err("order expired first");
    assert!(matches!(err, AppError::OrderNotPayable(id) if id == stale));
    assert_eq!(stock_of(state, mug.id).await?, 6);

    // Already cancelled, so a second pass leaves it and its stock alone.
    let again = sweep::sweep_expired_orders(state, Utc::now()).await?;
    assert!(!again.cancelled.contains(&stale));
    assert!(!again.cancelled.contains(&reopened));
    assert_eq!(stock_of(state, mug.id).await?, 6);
    Ok(())
}
