use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ConnectionTrait, EntityTrait,
    sea_query::OnConflict,
};

use crate::{
    audit::{self, AuditEntry},
    dto::settings::UpdateSettingsRequest,
    entity::store_settings::{self, ActiveModel as SettingsActive, Column as SettingsCol},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::StoreSettings,
    response::ApiResponse,
    state::AppState,
};

const SETTINGS_ID: i32 = 1;

/// Read the settings row, creating it with defaults on first access.
pub async fn get_or_create<C: ConnectionTrait>(
    conn: &C,
    default_currency: &str,
) -> AppResult<StoreSettings> {
    if let Some(row) = store_settings::Entity::find_by_id(SETTINGS_ID)
        .one(conn)
        .await?
    {
        return Ok(row.into());
    }

    let defaults = StoreSettings::defaults(default_currency);
    store_settings::Entity::insert(active_from(&defaults))
        .on_conflict(OnConflict::column(SettingsCol::Id).do_nothing().to_owned())
        .do_nothing()
        .exec(conn)
        .await?;
    tracing::info!("store settings initialised with defaults");

    // A concurrent first access may have won the insert; read back whichever row exists.
    let row = store_settings::Entity::find_by_id(SETTINGS_ID)
        .one(conn)
        .await?;
    Ok(row.map(StoreSettings::from).unwrap_or(defaults))
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<StoreSettings>> {
    let settings = get_or_create(&state.orm, &state.config.store_currency).await?;
    Ok(ApiResponse::item("Store settings", settings))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<StoreSettings>> {
    ensure_admin(user)?;
    payload.validate()?;

    let current = get_or_create(&state.orm, &state.config.store_currency).await?;
    let updated = StoreSettings {
        base_shipping_rate: payload.base_shipping_rate,
        per_kg_rate: payload.per_kg_rate,
        free_shipping_threshold: payload.free_shipping_threshold,
        tax_percent: payload.tax_percent,
        currency: payload.currency.unwrap_or(current.currency),
    };

    let mut active = active_from(&updated);
    active.updated_at = Set(Utc::now().into());
    store_settings::Entity::insert(active)
        .on_conflict(
            OnConflict::column(SettingsCol::Id)
                .update_columns([
                    SettingsCol::BaseShippingRate,
                    SettingsCol::PerKgRate,
                    SettingsCol::FreeShippingThreshold,
                    SettingsCol::TaxPercent,
                    SettingsCol::Currency,
                    SettingsCol::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "settings_update",
            "store_settings",
            serde_json::json!({
                "base_shipping_rate": updated.base_shipping_rate,
                "per_kg_rate": updated.per_kg_rate,
                "free_shipping_threshold": updated.free_shipping_threshold,
                "tax_percent": updated.tax_percent,
            }),
        ),
    )
    .await;

    Ok(ApiResponse::item("Store settings updated", updated))
}

fn active_from(settings: &StoreSettings) -> SettingsActive {
    SettingsActive {
        id: Set(SETTINGS_ID),
        base_shipping_rate: Set(settings.base_shipping_rate),
        per_kg_rate: Set(settings.per_kg_rate),
        free_shipping_threshold: Set(settings.free_shipping_threshold),
        tax_percent: Set(settings.tax_percent),
        currency: Set(settings.currency.clone()),
        updated_at: NotSet,
    }
}
