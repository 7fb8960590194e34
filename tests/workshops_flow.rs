mod common;

use chrono::{Duration, Utc};
use pottery_commerce_api::{
    dto::{
        payments::{PaymentTarget, VerifyPaymentRequest},
        workshops::{BookSessionRequest, RescheduleRequest},
    },
    entity::workshop_sessions::Entity as WorkshopSessions,
    error::AppError,
    middleware::auth::AuthUser,
    models::PaymentStatus,
    services::{notifier::NotificationEvent, payment, workshop_service},
    state::AppState,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

use common::{customer, insert_session, insert_workshop, setup, signature};

fn booking(name: &str, email: &str) -> BookSessionRequest {
    BookSessionRequest {
        name: Some(name.into()),
        email: Some(email.into()),
    }
}

async fn spots_booked(state: &AppState, session_id: Uuid) -> anyhow::Result<i32> {
    let session = WorkshopSessions::find_by_id(session_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("session {session_id} missing"))?;
    Ok(session.spots_booked)
}

// Two customers race for the last spot: exactly one gets it.
#[tokio::test]
async fn last_spot_goes_to_exactly_one_booking() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let workshop = insert_workshop(state, 0).await?;
    let session = insert_session(state, workshop.id, Utc::now() + Duration::days(5), 1).await?;

    let session_id = session.id;
    let first = state.clone();
    let second = state.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            workshop_service::book_session(&first, None, session_id, booking("Meera", "meera@example.com")).await
        }),
        tokio::spawn(async move {
            workshop_service::book_session(&second, None, session_id, booking("Kabir", "kabir@example.com")).await
        }),
    );
    let results = [a?, b?];

    let booked = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::SoldOut)))
        .count();
    assert_eq!(booked, 1);
    assert_eq!(sold_out, 1);
    assert_eq!(spots_booked(state, session.id).await?, 1);

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::WorkshopBooked), 1);
    Ok(())
}

// A crowd racing for one spot still fills it exactly once.
#[tokio::test]
async fn one_spot_among_many_concurrent_bookings() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let workshop = insert_workshop(state, 0).await?;
    let session = insert_session(state, workshop.id, Utc::now() + Duration::days(6), 1).await?;
    let session_id = session.id;

    let mut handles = Vec::new();
    for n in 0..6 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let email = format!("student{n}-{}@example.com", session_id.simple());
            workshop_service::book_session(&state, None, session_id, booking("Student", &email)).await
        }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await?);
    }

    let booked = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::SoldOut)))
        .count();
    assert_eq!(booked, 1);
    assert_eq!(sold_out, 5);
    assert_eq!(spots_booked(state, session_id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn same_email_cannot_book_a_session_twice() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let workshop = insert_workshop(state, 0).await?;
    let session = insert_session(state, workshop.id, Utc::now() + Duration::days(5), 4).await?;

    workshop_service::book_session(state, None, session.id, booking("Meera", "meera@example.com")).await?;
    let err = workshop_service::book_session(state, None, session.id, booking("Meera", "MEERA@example.com"))
        .await
        .expect_err("already registered");
    assert!(matches!(err, AppError::DuplicateBooking));
    assert_eq!(spots_booked(state, session.id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn paid_workshop_is_settled_by_payment_verification() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let student = customer();

    let workshop = insert_workshop(state, 3500).await?;
    let session = insert_session(state, workshop.id, Utc::now() + Duration::days(7), 6).await?;

    let booked = workshop_service::book_session(
        state,
        Some(&student),
        session.id,
        BookSessionRequest {
            name: Some("Asha".into()),
            email: None,
        },
    )
    .await?
    .data
    .expect("booking");
    assert_eq!(booked.registration.payment_status, PaymentStatus::Pending);
    assert_eq!(booked.registration.email, student.email.clone().unwrap_or_default());
    let intent = booked.payment.expect("paid workshop needs a payment");
    assert_eq!(intent.amount, 3500);

    let request = VerifyPaymentRequest {
        gateway_order_id: intent.gateway_order_id.clone(),
        payment_id: "pay_ws_1".into(),
        signature: signature(&intent.gateway_order_id, "pay_ws_1"),
    };
    let verified = payment::verify_payment(state, request).await?.data.expect("verification");
    assert_eq!(verified.target, PaymentTarget::WorkshopRegistration);
    assert_eq!(verified.id, booked.registration.id);
    assert!(!verified.already_confirmed);

    let mine = workshop_service::my_registrations(state, &student)
        .await?
        .data
        .expect("registrations");
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].payment_status, PaymentStatus::Paid);

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::WorkshopBooked), 1);
    Ok(())
}

async fn booked_student(
    state: &AppState,
    session_id: Uuid,
) -> anyhow::Result<(AuthUser, Uuid)> {
    let student = customer();
    let booked = workshop_service::book_session(
        state,
        Some(&student),
        session_id,
        BookSessionRequest {
            name: Some("Ravi".into()),
            email: None,
        },
    )
    .await?
    .data
    .expect("booking");
    Ok((student, booked.registration.id))
}

#[tokio::test]
async fn a_registration_can_be_rescheduled_once() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let workshop = insert_workshop(state, 0).await?;
    let now = Utc::now();
    let original = insert_session(state, workshop.id, now + Duration::days(5), 4).await?;
    let later = insert_session(state, workshop.id, now + Duration::days(12), 4).await?;
    let latest = insert_session(state, workshop.id, now + Duration::days(19), 4).await?;

    let (student, registration_id) = booked_student(state, original.id).await?;

    let moved = workshop_service::reschedule(
        state,
        &student,
        registration_id,
        RescheduleRequest { session_id: later.id },
    )
    .await?
    .data
    .expect("reschedule");
    assert!(moved.registration.rescheduled);
    assert_eq!(moved.registration.session_id, later.id);
    assert_eq!(moved.from_session.spots_booked, 0);
    assert_eq!(moved.to_session.spots_booked, 1);

    let err = workshop_service::reschedule(
        state,
        &student,
        registration_id,
        RescheduleRequest { session_id: latest.id },
    )
    .await
    .expect_err("only one reschedule");
    assert!(matches!(err, AppError::AlreadyRescheduled));
    assert_eq!(spots_booked(state, later.id).await?, 1);
    assert_eq!(spots_booked(state, latest.id).await?, 0);

    app.notifier.settle().await;
    assert_eq!(app.notifier.count(NotificationEvent::WorkshopRescheduled), 1);
    Ok(())
}

#[tokio::test]
async fn rescheduling_inside_48_hours_is_refused() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let workshop = insert_workshop(state, 0).await?;
    let now = Utc::now();
    let soon = insert_session(state, workshop.id, now + Duration::days(4), 4).await?;
    let later = insert_session(state, workshop.id, now + Duration::days(10), 4).await?;

    let (student, registration_id) = booked_student(state, soon.id).await?;

    // Pretend it is now 47 hours before the booked session.
    let near_start = now + Duration::days(4) - Duration::hours(47);
    let err = workshop_service::reschedule_at(
        state,
        &student,
        registration_id,
        RescheduleRequest { session_id: later.id },
        near_start,
    )
    .await
    .expect_err("window closed");
    assert!(matches!(err, AppError::RescheduleWindowClosed));
    assert_eq!(spots_booked(state, soon.id).await?, 1);
    assert_eq!(spots_booked(state, later.id).await?, 0);

    let err = workshop_service::reschedule(
        state,
        &customer(),
        registration_id,
        RescheduleRequest { session_id: later.id },
    )
    .await
    .expect_err("not the owner");
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

// The 48 hour rule wins even when the destination could not take the booking anyway.
#[tokio::test]
async fn late_reschedule_to_a_full_session_reports_the_window() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let workshop = insert_workshop(state, 0).await?;
    let now = Utc::now();
    let soon = insert_session(state, workshop.id, now + Duration::days(3), 4).await?;
    let full = insert_session(state, workshop.id, now + Duration::days(9), 1).await?;

    let (student, registration_id) = booked_student(state, soon.id).await?;
    booked_student(state, full.id).await?;
    assert_eq!(spots_booked(state, full.id).await?, 1);

    let near_start = now + Duration::days(3) - Duration::hours(30);
    let err = workshop_service::reschedule_at(
        state,
        &student,
        registration_id,
        RescheduleRequest { session_id: full.id },
        near_start,
    )
    .await
    .expect_err("window closed");
    assert!(matches!(err, AppError::RescheduleWindowClosed));
    assert_eq!(spots_booked(state, soon.id).await?, 1);
    assert_eq!(spots_booked(state, full.id).await?, 1);

    // Outside the window the same move fails on capacity instead.
    let err = workshop_service::reschedule(
        state,
        &student,
        registration_id,
        RescheduleRequest { session_id: full.id },
    )
    .await
    .expect_err("destination is full");
    assert!(matches!(err, AppError::SoldOut));
    Ok(())
}
