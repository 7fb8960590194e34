mod common;

use pottery_commerce_api::{
    dto::{
        custom_orders::{CreateCustomOrderRequest, QuoteCustomOrderRequest, UpdateCustomOrderStatusRequest},
        payments::{PaymentTarget, VerifyPaymentRequest},
    },
    error::AppError,
    models::{CustomOrderStatus, PaymentStatus},
    services::{custom_order_service, notifier::NotificationEvent, payment},
};

use common::{admin, customer, setup, signature};

fn commission() -> CreateCustomOrderRequest {
    CreateCustomOrderRequest {
        name: Some("Nila".into()),
        email: None,
        description: "A set of six ramen bowls in a deep blue glaze".into(),
        reference_images: vec!["https://example.com/bowls.jpg".into()],
        budget: Some(9000),
    }
}

#[tokio::test]
async fn commission_is_quoted_approved_and_paid() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let client = customer();
    let staff = admin();

    let order = custom_order_service::create_custom_order(state, Some(&client), commission())
        .await?
        .data
        .expect("custom order");
    assert_eq!(order.status, CustomOrderStatus::Pending);
    assert_eq!(order.reference_images.len(), 1);

    // Paying before a quote is accepted is refused.
    let err = custom_order_service::create_payment(state, &client, order.id)
        .await
        .expect_err("not approved yet");
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let quoted = custom_order_service::quote_custom_order(
        state,
        &staff,
        order.id,
        QuoteCustomOrderRequest {
            price: 8400,
            note: Some("Two week lead time".into()),
        },
    )
    .await?
    .data
    .expect("quoted");
    assert_eq!(quoted.status, CustomOrderStatus::Quoted);
    assert_eq!(quoted.quoted_price, Some(8400));

    let approved = custom_order_service::approve_quote(state, &client, order.id)
        .await?
        .data
        .expect("approved");
    assert_eq!(approved.status, CustomOrderStatus::Approved);

    let checkout = custom_order_service::create_payment(state, &client, order.id)
        .await?
        .data
        .expect("payment");
    assert_eq!(checkout.payment.amount, 8400);

    let gateway_order_id = checkout.payment.gateway_order_id;
    let verified = payment::verify_payment(
        state,
        VerifyPaymentRequest {
            gateway_order_id: gateway_order_id.clone(),
            payment_id: "pay_co_1".into(),
            signature: signature(&gateway_order_id, "pay_co_1"),
        },
    )
    .await?
    .data
    .expect("verification");
    assert_eq!(verified.target, PaymentTarget::CustomOrder);
    assert!(!verified.already_confirmed);

    let in_progress = custom_order_service::update_status(
        state,
        &staff,
        order.id,
        UpdateCustomOrderStatusRequest { status: CustomOrderStatus::InProgress },
    )
    .await?
    .data
    .expect("updated");
    assert_eq!(in_progress.status, CustomOrderStatus::InProgress);
    assert_eq!(in_progress.payment_status, PaymentStatus::Paid);

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::CustomOrderReceived), 1);
    assert_eq!(app.notifier.count(NotificationEvent::CustomOrderQuoted), 1);
    Ok(())
}

#[tokio::test]
async fn status_endpoint_cannot_skip_quote_or_payment() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let staff = admin();

    let order = custom_order_service::create_custom_order(state, Some(&customer()), commission())
        .await?
        .data
        .expect("custom order");

    let err = custom_order_service::update_status(
        state,
        &staff,
        order.id,
        UpdateCustomOrderStatusRequest { status: CustomOrderStatus::Paid },
    )
    .await
    .expect_err("paid comes from payment verification");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = custom_order_service::update_status(
        state,
        &staff,
        order.id,
        UpdateCustomOrderStatusRequest { status: CustomOrderStatus::Completed },
    )
    .await
    .expect_err("cannot jump to completed");
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let cancelled = custom_order_service::update_status(
        state,
        &staff,
        order.id,
        UpdateCustomOrderStatusRequest { status: CustomOrderStatus::Cancelled },
    )
    .await?
    .data
    .expect("cancelled");
    assert_eq!(cancelled.status, CustomOrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);

    let err = custom_order_service::approve_quote(state, &customer(), order.id)
        .await
        .expect_err("someone else's commission");
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
