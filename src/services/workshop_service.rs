//! Workshop sessions and the bookings against them.
//!
//! `spots_booked` only moves while the session row is held `FOR UPDATE`, so
//! concurrent bookings for the last spot queue up and exactly one wins.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::LockType,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::{
        orders::PaymentIntent,
        payments::{PaymentTarget, PaymentVerification},
        validate_contact,
        workshops::{
            BookSessionRequest, BookingResponse, CreateSessionRequest, CreateWorkshopRequest,
            RegistrationList, RescheduleRequest, RescheduleResponse, WorkshopDetail, WorkshopList,
        },
    },
    entity::{
        workshop_registrations::{
            ActiveModel as RegistrationActive, Column as RegCol, Entity as WorkshopRegistrations,
            Model as RegistrationModel,
        },
        workshop_sessions::{
            ActiveModel as SessionActive, Column as SessionCol, Entity as WorkshopSessions,
            Model as SessionModel,
        },
        workshops::{ActiveModel as WorkshopActive, Column as WorkshopCol, Entity as Workshops},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{PaymentStatus, Workshop, WorkshopRegistration, WorkshopSession},
    response::ApiResponse,
    routes::params::PageQuery,
    services::{
        gateway::CreateGatewayOrder,
        notifier::{Notification, NotificationEvent, Recipient, dispatch_after_commit},
        settings_service,
    },
    state::AppState,
};

/// Rescheduling closes this long before the booked session starts.
pub const RESCHEDULE_CUTOFF_HOURS: i64 = 48;

/// Fails once `now` is inside the cutoff before `starts_at`.
pub fn ensure_reschedule_window(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if starts_at - now < Duration::hours(RESCHEDULE_CUTOFF_HOURS) {
        return Err(AppError::RescheduleWindowClosed);
    }
    Ok(())
}

fn starts_at(session: &SessionModel) -> DateTime<Utc> {
    session.starts_at.with_timezone(&Utc)
}

pub async fn list_workshops(state: &AppState, query: PageQuery) -> AppResult<ApiResponse<WorkshopList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = Workshops::find().order_by_asc(WorkshopCol::Title);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Workshop::from)
        .collect();

    Ok(ApiResponse::page("Workshops", WorkshopList { items }, page, limit, total))
}

/// Workshop with its upcoming sessions and the spots left in each.
pub async fn get_workshop(state: &AppState, slug: &str) -> AppResult<ApiResponse<WorkshopDetail>> {
    let workshop = Workshops::find()
        .filter(WorkshopCol::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let sessions = WorkshopSessions::find()
        .filter(SessionCol::WorkshopId.eq(workshop.id))
        .filter(SessionCol::StartsAt.gt(Utc::now()))
        .order_by_asc(SessionCol::StartsAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WorkshopSession::from)
        .collect();

    Ok(ApiResponse::item(
        "Workshop",
        WorkshopDetail {
            workshop: Workshop::from(workshop),
            sessions,
        },
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = ?user.map(|u| u.user_id)))]
pub async fn book_session(
    state: &AppState,
    user: Option<&AuthUser>,
    session_id: Uuid,
    payload: BookSessionRequest,
) -> AppResult<ApiResponse<BookingResponse>> {
    let email = payload
        .email
        .as_deref()
        .or(user.and_then(|u| u.email.as_deref()))
        .ok_or_else(|| AppError::BadRequest("email is required".into()))?
        .trim()
        .to_lowercase();
    let name = payload.name.as_deref().unwrap_or_default().trim().to_string();
    validate_contact(&email, &name)?;

    let session = WorkshopSessions::find_by_id(session_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if starts_at(&session) <= Utc::now() {
        return Err(AppError::BadRequest("session has already started".into()));
    }
    // Cheap early answer; the authoritative check runs under the row lock.
    if !session.has_capacity() {
        return Err(AppError::SoldOut);
    }
    let workshop = Workshops::find_by_id(session.workshop_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let registration_id = Uuid::new_v4();
    let intent = if workshop.price > 0 {
        let settings = settings_service::get_or_create(&state.orm, &state.config.store_currency).await?;
        let receipt = format!("WS-{}", &registration_id.simple().to_string()[..8].to_uppercase());
        Some(
            state
                .gateway
                .create_order(CreateGatewayOrder {
                    amount: workshop.price,
                    currency: settings.currency,
                    receipt,
                })
                .await?,
        )
    } else {
        None
    };

    let new_registration = RegistrationActive {
        id: Set(registration_id),
        session_id: Set(session_id),
        user_id: Set(user.map(|u| u.user_id)),
        name: Set(name),
        email: Set(email.clone()),
        amount: Set(workshop.price),
        payment_status: Set(if intent.is_some() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        }),
        gateway_order_id: Set(intent.as_ref().map(|i| i.id.clone())),
        payment_id: Set(None),
        rescheduled: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    };

    let (registration, session) = match claim_spot(state, session_id, &email, new_registration).await {
        Ok(booked) => booked,
        Err(err) => {
            if let Some(intent) = &intent {
                warn!(gateway_order_id = %intent.id, error = %err, "booking failed, gateway intent abandoned");
            }
            return Err(err);
        }
    };

    info!(
        registration_id = %registration.id,
        session_id = %session.id,
        spots_booked = session.spots_booked,
        "session booked"
    );
    if registration.payment_status == PaymentStatus::Paid {
        dispatch_after_commit(state.notifier.clone(), vec![booked_notification(&registration)]);
    }
    audit::record(
        &state.pool,
        AuditEntry::new(
            registration.user_id,
            "workshop_book",
            "workshop_registrations",
            json!({ "registration_id": registration.id, "session_id": session.id }),
        ),
    )
    .await;

    let payment = intent.map(|intent| PaymentIntent {
        gateway_order_id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
        key_id: state.gateway.key_id().map(str::to_string),
    });
    Ok(ApiResponse::item(
        "Session booked",
        BookingResponse {
            registration: WorkshopRegistration::from(registration),
            session: WorkshopSession::from(session),
            payment,
        },
    ))
}

async fn claim_spot(
    state: &AppState,
    session_id: Uuid,
    email: &str,
    registration: RegistrationActive,
) -> AppResult<(RegistrationModel, SessionModel)> {
    let txn = state.orm.begin().await?;
    let session = WorkshopSessions::find_by_id(session_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if !session.has_capacity() {
        return Err(AppError::SoldOut);
    }

    ensure_not_registered(&txn, session_id, email).await?;

    let registration = registration.insert(&txn).await?;
    let session = increment_booked(&txn, session, 1).await?;
    txn.commit().await?;
    Ok((registration, session))
}

async fn ensure_not_registered(txn: &DatabaseTransaction, session_id: Uuid, email: &str) -> AppResult<()> {
    let existing = WorkshopRegistrations::find()
        .filter(RegCol::SessionId.eq(session_id))
        .filter(RegCol::Email.eq(email))
        .count(txn)
        .await?;
    if existing > 0 {
        return Err(AppError::DuplicateBooking);
    }
    Ok(())
}

async fn increment_booked(txn: &DatabaseTransaction, session: SessionModel, by: i32) -> AppResult<SessionModel> {
    let booked = session.spots_booked + by;
    let mut active: SessionActive = session.into();
    active.spots_booked = Set(booked);
    Ok(active.update(txn).await?)
}

fn booked_notification(registration: &RegistrationModel) -> Notification {
    Notification::new(
        Recipient::for_customer(registration.user_id, &registration.email),
        NotificationEvent::WorkshopBooked,
        json!({
            "registration_id": registration.id,
            "session_id": registration.session_id,
        }),
    )
}

pub async fn reschedule(
    state: &AppState,
    user: &AuthUser,
    registration_id: Uuid,
    payload: RescheduleRequest,
) -> AppResult<ApiResponse<RescheduleResponse>> {
    reschedule_at(state, user, registration_id, payload, Utc::now()).await
}

/// Move a registration to another session of the same workshop, once.
#[instrument(skip(state, user, payload), fields(user_id = %user.user_id, to_session = %payload.session_id))]
pub async fn reschedule_at(
    state: &AppState,
    user: &AuthUser,
    registration_id: Uuid,
    payload: RescheduleRequest,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<RescheduleResponse>> {
    let registration = WorkshopRegistrations::find_by_id(registration_id)
        .one(&state.orm)
        .await?
        .filter(|r| user.can_access(r.user_id))
        .ok_or(AppError::NotFound)?;
    if registration.rescheduled {
        return Err(AppError::AlreadyRescheduled);
    }

    let source = WorkshopSessions::find_by_id(registration.session_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_reschedule_window(starts_at(&source), now)?;

    if payload.session_id == source.id {
        return Err(AppError::BadRequest("choose a different session".into()));
    }
    let destination = WorkshopSessions::find_by_id(payload.session_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if destination.workshop_id != source.workshop_id {
        return Err(AppError::BadRequest(
            "sessions can only be swapped within the same workshop".into(),
        ));
    }
    if starts_at(&destination) <= now {
        return Err(AppError::BadRequest("session has already started".into()));
    }
    if !destination.has_capacity() {
        return Err(AppError::SoldOut);
    }

    let txn = state.orm.begin().await?;
    // Both rows locked in id order so two opposite swaps cannot deadlock.
    let locked = WorkshopSessions::find()
        .filter(SessionCol::Id.is_in([source.id, destination.id]))
        .order_by_asc(SessionCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let find_locked = |id: Uuid| {
        locked
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    };
    let source = find_locked(source.id)?;
    let destination = find_locked(destination.id)?;

    let registration = WorkshopRegistrations::find_by_id(registration.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if registration.rescheduled {
        return Err(AppError::AlreadyRescheduled);
    }
    if registration.session_id != source.id {
        return Err(AppError::BadRequest("registration moved concurrently, retry".into()));
    }
    if !destination.has_capacity() {
        return Err(AppError::SoldOut);
    }
    ensure_not_registered(&txn, destination.id, &registration.email).await?;

    let from_session = increment_booked(&txn, source, -1).await?;
    let to_session = increment_booked(&txn, destination, 1).await?;

    let mut active: RegistrationActive = registration.into();
    active.session_id = Set(to_session.id);
    active.rescheduled = Set(true);
    active.updated_at = Set(now.into());
    let registration = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        registration_id = %registration.id,
        from_session = %from_session.id,
        to_session = %to_session.id,
        "registration rescheduled"
    );
    dispatch_after_commit(
        state.notifier.clone(),
        vec![Notification::new(
            Recipient::for_customer(registration.user_id, &registration.email),
            NotificationEvent::WorkshopRescheduled,
            json!({
                "registration_id": registration.id,
                "from_session": from_session.id,
                "to_session": to_session.id,
                "starts_at": starts_at(&to_session),
            }),
        )],
    );
    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "workshop_reschedule",
            "workshop_registrations",
            json!({ "registration_id": registration.id, "to_session": to_session.id }),
        ),
    )
    .await;

    Ok(ApiResponse::item(
        "Registration rescheduled",
        RescheduleResponse {
            registration: WorkshopRegistration::from(registration),
            from_session: WorkshopSession::from(from_session),
            to_session: WorkshopSession::from(to_session),
        },
    ))
}

/// Settle the registration paid through `gateway_order_id`, once.
#[instrument(skip(state))]
pub(crate) async fn confirm_payment(
    state: &AppState,
    gateway_order_id: &str,
    payment_id: &str,
) -> AppResult<Option<PaymentVerification>> {
    let txn = state.orm.begin().await?;
    let Some(registration) = WorkshopRegistrations::find()
        .filter(RegCol::GatewayOrderId.eq(gateway_order_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
    else {
        return Ok(None);
    };

    if registration.payment_status == PaymentStatus::Paid {
        return Ok(Some(PaymentVerification {
            target: PaymentTarget::WorkshopRegistration,
            id: registration.id,
            already_confirmed: true,
        }));
    }

    let mut active: RegistrationActive = registration.into();
    active.payment_status = Set(PaymentStatus::Paid);
    active.payment_id = Set(Some(payment_id.to_string()));
    active.updated_at = Set(Utc::now().into());
    let registration = active.update(&txn).await?;
    txn.commit().await?;

    info!(registration_id = %registration.id, "workshop payment confirmed");
    dispatch_after_commit(state.notifier.clone(), vec![booked_notification(&registration)]);

    Ok(Some(PaymentVerification {
        target: PaymentTarget::WorkshopRegistration,
        id: registration.id,
        already_confirmed: false,
    }))
}

pub async fn my_registrations(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<RegistrationList>> {
    let items = WorkshopRegistrations::find()
        .filter(RegCol::UserId.eq(user.user_id))
        .order_by_desc(RegCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WorkshopRegistration::from)
        .collect();
    Ok(ApiResponse::item("Registrations", RegistrationList { items }))
}

pub async fn create_workshop(
    state: &AppState,
    user: &AuthUser,
    payload: CreateWorkshopRequest,
) -> AppResult<ApiResponse<Workshop>> {
    ensure_admin(user)?;
    payload.validate()?;

    let slug = payload.slug.trim().to_lowercase();
    let taken = Workshops::find()
        .filter(WorkshopCol::Slug.eq(slug.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::BadRequest(format!("slug '{slug}' is already used")));
    }

    let workshop = WorkshopActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        duration_minutes: Set(payload.duration_minutes),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "workshop_create",
            "workshops",
            json!({ "workshop_id": workshop.id }),
        ),
    )
    .await;
    Ok(ApiResponse::item("Workshop created", Workshop::from(workshop)))
}

pub async fn create_session(
    state: &AppState,
    user: &AuthUser,
    workshop_id: Uuid,
    payload: CreateSessionRequest,
) -> AppResult<ApiResponse<WorkshopSession>> {
    ensure_admin(user)?;
    payload.validate(Utc::now())?;
    Workshops::find_by_id(workshop_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let session = SessionActive {
        id: Set(Uuid::new_v4()),
        workshop_id: Set(workshop_id),
        starts_at: Set(payload.starts_at.into()),
        spots_total: Set(payload.spots_total),
        spots_booked: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    info!(session_id = %session.id, workshop_id = %workshop_id, "session scheduled");
    Ok(ApiResponse::item("Session created", WorkshopSession::from(session)))
}

pub async fn list_session_registrations(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
) -> AppResult<ApiResponse<RegistrationList>> {
    ensure_admin(user)?;
    WorkshopSessions::find_by_id(session_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = WorkshopRegistrations::find()
        .filter(RegCol::SessionId.eq(session_id))
        .order_by_asc(RegCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(WorkshopRegistration::from)
        .collect();
    Ok(ApiResponse::item("Registrations", RegistrationList { items }))
}
