use chrono::{Duration, Utc};
use pottery_commerce_api::{
    error::AppError,
    models::{CustomOrderStatus, OrderStatus},
    services::workshop_service::ensure_reschedule_window,
};

#[test]
fn orders_follow_the_forward_path() {
    use OrderStatus::*;

    assert!(Pending.can_advance_to(Confirmed));
    assert!(Pending.can_advance_to(Processing));
    assert!(Confirmed.can_advance_to(Shipped));
    assert!(Shipped.can_advance_to(Delivered));

    assert!(!Pending.can_advance_to(Delivered));
    assert!(!Shipped.can_advance_to(Pending));
    assert!(!Delivered.can_advance_to(Cancelled));
}

#[test]
fn cancellation_is_final() {
    use OrderStatus::*;

    assert!(Confirmed.can_advance_to(Cancelled));
    assert!(Cancelled.is_terminal());
    assert!(!Cancelled.admin_can_set(Pending));
    assert!(!Cancelled.admin_can_set(Confirmed));
    assert!(Delivered.admin_can_set(Shipped));
}

#[test]
fn shipped_goods_never_return_to_a_reserving_status() {
    use OrderStatus::*;

    for from in [Shipped, Delivered] {
        assert!(!from.admin_can_set(Pending));
        assert!(!from.admin_can_set(Processing));
        assert!(!from.admin_can_set(Confirmed));
        assert!(from.admin_can_set(Cancelled));
    }
    assert!(Shipped.admin_can_set(Delivered));
    assert!(Confirmed.admin_can_set(Pending));
    assert!(Processing.admin_can_set(Confirmed));
}

#[test]
fn only_unshipped_orders_hold_stock() {
    use OrderStatus::*;

    assert!(Pending.holds_reserved_stock());
    assert!(Confirmed.holds_reserved_stock());
    assert!(!Shipped.holds_reserved_stock());
    assert!(!Cancelled.holds_reserved_stock());
}

#[test]
fn custom_orders_are_quoted_before_payment() {
    use CustomOrderStatus::*;

    assert!(Pending.can_transition_to(Quoted));
    assert!(Quoted.can_transition_to(Quoted));
    assert!(Quoted.can_transition_to(Approved));
    assert!(Approved.can_transition_to(Paid));
    assert!(Paid.can_transition_to(InProgress));
    assert!(InProgress.can_transition_to(Completed));

    assert!(!Pending.can_transition_to(Approved));
    assert!(!Quoted.can_transition_to(Paid));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(Paid.is_paid());
    assert!(!Approved.is_paid());
}

#[test]
fn rescheduling_closes_48_hours_out() {
    let now = Utc::now();

    assert!(ensure_reschedule_window(now + Duration::hours(72), now).is_ok());
    assert!(ensure_reschedule_window(now + Duration::hours(48), now).is_ok());
    assert!(matches!(
        ensure_reschedule_window(now + Duration::hours(47), now),
        Err(AppError::RescheduleWindowClosed)
    ));
}
