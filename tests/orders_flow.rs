mod common;

use axum::http::StatusCode;
use pottery_commerce_api::{
    dto::{
        orders::{CreateOrderRequest, LineItemRequest, UpdateOrderStatusRequest},
        payments::VerifyPaymentRequest,
    },
    error::AppError,
    models::{OrderStatus, PaymentStatus},
    services::{admin_service, notifier::NotificationEvent, order_service, payment},
};

use common::{address, admin, customer, insert_product, setup, signature, stock_of};

fn order_for(items: Vec<LineItemRequest>) -> CreateOrderRequest {
    CreateOrderRequest {
        items,
        shipping_address: address(),
        email: None,
        name: None,
        notes: None,
    }
}

fn verify_request(gateway_order_id: &str, payment_id: &str) -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        gateway_order_id: gateway_order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: signature(gateway_order_id, payment_id),
    }
}

// Checkout reserves stock once; paying twice neither moves it again nor notifies twice.
#[tokio::test]
async fn checkout_reserves_stock_and_payment_is_idempotent() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let buyer = customer();

    let mug = insert_product(state, 1800, 5, 500).await?;
    let vase = insert_product(state, 2200, 1, 1000).await?;

    let checkout = order_service::create_order(
        state,
        Some(&buyer),
        order_for(vec![
            LineItemRequest { product_id: mug.id, quantity: 1 },
            LineItemRequest { product_id: vase.id, quantity: 1 },
            LineItemRequest { product_id: mug.id, quantity: 1 },
        ]),
    )
    .await?
    .data
    .expect("checkout data");

    assert_eq!(checkout.order.status, OrderStatus::Pending);
    assert_eq!(checkout.order.total, 6586);
    assert_eq!(checkout.payment.amount, 6586);
    assert_eq!(checkout.items.len(), 2);
    assert_eq!(checkout.order.customer_email, buyer.email.clone().unwrap_or_default());
    assert!(checkout.order.order_number.starts_with("ORD-"));
    assert_eq!(stock_of(state, mug.id).await?, 3);
    assert_eq!(stock_of(state, vase.id).await?, 0);

    let gateway_order_id = checkout.payment.gateway_order_id.clone();
    let first = payment::verify_payment(state, verify_request(&gateway_order_id, "pay_001"))
        .await?
        .data
        .expect("verification");
    assert!(!first.already_confirmed);
    assert_eq!(first.id, checkout.order.id);

    let second = payment::verify_payment(state, verify_request(&gateway_order_id, "pay_001")).await?;
    assert_eq!(second.message, "Payment already verified");
    assert!(second.data.expect("verification").already_confirmed);

    let order = order_service::get_order(state, &buyer, checkout.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(order.order.status, OrderStatus::Confirmed);
    assert_eq!(order.order.payment_status, PaymentStatus::Paid);
    assert!(order.order.paid_at.is_some());
    assert_eq!(stock_of(state, mug.id).await?, 3);
    assert_eq!(stock_of(state, vase.id).await?, 0);

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::OrderConfirmed), 1);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_is_a_conflict_and_reserves_nothing() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let bowl = insert_product(state, 2400, 1, 900).await?;
    let err = order_service::create_order(
        state,
        Some(&customer()),
        order_for(vec![LineItemRequest { product_id: bowl.id, quantity: 2 }]),
    )
    .await
    .expect_err("only one bowl in stock");

    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    match err {
        AppError::InsufficientStock { product_id, requested, available, .. } => {
            assert_eq!(product_id, bowl.id);
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stock_of(state, bowl.id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn guest_checkout_requires_an_email() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let plate = insert_product(state, 6200, 3, 3200).await?;
    let err = order_service::create_order(
        state,
        None,
        order_for(vec![LineItemRequest { product_id: plate.id, quantity: 1 }]),
    )
    .await
    .expect_err("guest without email");
    assert!(matches!(err, AppError::BadRequest(_)));

    let mut guest = order_for(vec![LineItemRequest { product_id: plate.id, quantity: 1 }]);
    guest.email = Some("Guest@Example.com".into());
    let checkout = order_service::create_order(state, None, guest)
        .await?
        .data
        .expect("checkout data");
    assert_eq!(checkout.order.user_id, None);
    assert_eq!(checkout.order.customer_email, "guest@example.com");
    assert_eq!(stock_of(state, plate.id).await?, 2);
    Ok(())
}

#[tokio::test]
async fn tampered_payment_id_is_rejected() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let mug = insert_product(state, 1200, 4, 450).await?;
    let checkout = order_service::create_order(
        state,
        Some(&customer()),
        order_for(vec![LineItemRequest { product_id: mug.id, quantity: 1 }]),
    )
    .await?
    .data
    .expect("checkout data");

    let gateway_order_id = checkout.payment.gateway_order_id;
    let mut tampered = verify_request(&gateway_order_id, "pay_real");
    tampered.payment_id = "pay_forged".into();
    let err = payment::verify_payment(state, tampered)
        .await
        .expect_err("signature covers the payment id");
    assert!(matches!(err, AppError::SignatureMismatch));

    let order = admin_service::get_order_admin(state, &admin(), checkout.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(order.order.status, OrderStatus::Pending);
    Ok(())
}

// One notification per real change; cancelling gives the stock back and cannot be undone.
#[tokio::test]
async fn admin_status_updates_notify_once_and_cancel_restores_stock() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let staff = admin();

    let bowl = insert_product(state, 2400, 5, 900).await?;
    let checkout = order_service::create_order(
        state,
        Some(&customer()),
        order_for(vec![LineItemRequest { product_id: bowl.id, quantity: 2 }]),
    )
    .await?
    .data
    .expect("checkout data");
    let order_id = checkout.order.id;
    assert_eq!(stock_of(state, bowl.id).await?, 3);

    let unchanged = admin_service::update_order_status(
        state,
        &staff,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Pending, note: None },
    )
    .await?;
    assert_eq!(unchanged.message, "Order unchanged");

    let processing = admin_service::update_order_status(
        state,
        &staff,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Processing, note: None },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(processing.status, OrderStatus::Processing);

    let cancelled = admin_service::update_order_status(
        state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
            note: Some("Customer asked to cancel".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);
    assert_eq!(cancelled.notes.as_deref(), Some("Customer asked to cancel"));
    assert_eq!(stock_of(state, bowl.id).await?, 5);

    let err = admin_service::update_order_status(
        state,
        &staff,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Confirmed, note: None },
    )
    .await
    .expect_err("cancellation is final");
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::OrderStatusChanged), 1);
    assert_eq!(app.notifier.count(NotificationEvent::OrderCancelled), 1);
    Ok(())
}

#[tokio::test]
async fn customers_only_see_their_own_orders() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let owner = customer();

    let vase = insert_product(state, 800, 2, 200).await?;
    let checkout = order_service::create_order(
        state,
        Some(&owner),
        order_for(vec![LineItemRequest { product_id: vase.id, quantity: 1 }]),
    )
    .await?
    .data
    .expect("checkout data");

    let err = order_service::get_order(state, &customer(), checkout.order.id)
        .await
        .expect_err("someone else's order");
    assert!(matches!(err, AppError::NotFound));

    let err = admin_service::update_order_status(
        state,
        &owner,
        checkout.order.id,
        UpdateOrderStatusRequest { status: OrderStatus::Shipped, note: None },
    )
    .await
    .expect_err("customers cannot change status");
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

// Shipped goods stay consumed: the order cannot be pushed back into a reserving status.
#[tokio::test]
async fn shipped_orders_cannot_be_reopened() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let staff = admin();

    let platter = insert_product(state, 3100, 5, 1200).await?;
    let checkout = order_service::create_order(
        state,
        Some(&customer()),
        order_for(vec![LineItemRequest { product_id: platter.id, quantity: 2 }]),
    )
    .await?
    .data
    .expect("checkout data");
    let order_id = checkout.order.id;
    let gateway_order_id = checkout.payment.gateway_order_id;

    payment::verify_payment(state, verify_request(&gateway_order_id, "pay_ship")).await?;
    admin_service::update_order_status(
        state,
        &staff,
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Shipped, note: None },
    )
    .await?;
    assert_eq!(stock_of(state, platter.id).await?, 3);

    for status in [OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Confirmed] {
        let err = admin_service::update_order_status(
            state,
            &staff,
            order_id,
            UpdateOrderStatusRequest { status, note: None },
        )
        .await
        .expect_err("shipped goods cannot be reserved again");
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    let cancelled = admin_service::update_order_status(
        state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
            note: Some("Lost in transit".into()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Paid);
    assert_eq!(stock_of(state, platter.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn payment_for_a_cancelled_order_is_refused() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let jug = insert_product(state, 1500, 5, 700).await?;
    let checkout = order_service::create_order(
        state,
        Some(&customer()),
        order_for(vec![LineItemRequest { product_id: jug.id, quantity: 2 }]),
    )
    .await?
    .data
    .expect("checkout data");
    let order_id = checkout.order.id;

    admin_service::update_order_status(
        state,
        &admin(),
        order_id,
        UpdateOrderStatusRequest { status: OrderStatus::Cancelled, note: None },
    )
    .await?;
    assert_eq!(stock_of(state, jug.id).await?, 5);

    let gateway_order_id = checkout.payment.gateway_order_id;
    let err = payment::verify_payment(state, verify_request(&gateway_order_id, "pay_late"))
        .await
        .expect_err("order was cancelled first");
    assert!(matches!(err, AppError::OrderNotPayable(id) if id == order_id));
    assert_eq!(stock_of(state, jug.id).await?, 5);

    let order = admin_service::get_order_admin(state, &admin(), order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(order.order.status, OrderStatus::Cancelled);
    assert_eq!(order.order.payment_status, PaymentStatus::Failed);

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::OrderConfirmed), 0);
    Ok(())
}

#[tokio::test]
async fn signed_payment_for_an_unknown_gateway_order_is_not_found() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let gateway_order_id = format!("order_missing_{}", uuid::Uuid::new_v4().simple());
    let err = payment::verify_payment(state, verify_request(&gateway_order_id, "pay_ghost"))
        .await
        .expect_err("nothing was checked out under this id");
    assert!(matches!(err, AppError::GatewayOrderNotFound(ref id) if *id == gateway_order_id));
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    Ok(())
}
