//! Stock counters. Every mutation here runs on the caller's transaction so
//! stock never moves without the order or admin change that caused it.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::{
        orders::LineItemRequest,
        products::{InventoryAdjustRequest, ProductList},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::ApiResponse,
    routes::params::LowStockQuery,
    services::catalog::ProductSnapshot,
    state::AppState,
};

/// Take `quantity` off each product. Callers hold the product rows `FOR UPDATE`
/// and have checked availability; the `stock >= quantity` filter is a backstop.
pub async fn reserve(
    txn: &DatabaseTransaction,
    items: &[LineItemRequest],
    snapshots: &[ProductSnapshot],
) -> AppResult<()> {
    for (item, snapshot) in items.iter().zip(snapshots) {
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(ProdCol::Id.eq(item.product_id))
            .filter(ProdCol::Stock.gte(item.quantity))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::InsufficientStock {
                product_id: snapshot.id,
                name: snapshot.name.clone(),
                requested: item.quantity,
                available: snapshot.stock,
            });
        }
    }
    Ok(())
}

/// Put an order's line quantities back on the shelf. Returns the units restored.
pub async fn restore<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<i64> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?;

    let mut restored = 0i64;
    for item in items {
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            tracing::warn!(
                order_id = %order_id,
                product_id = %item.product_id,
                quantity = item.quantity,
                "product no longer in catalog, stock not restored"
            );
            continue;
        }
        restored += i64::from(item.quantity);
    }
    Ok(restored)
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::page("Low stock", ProductList { items }, page, limit, total))
}

/// Admin stock correction by an integer delta; stock never goes negative.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product
        .stock
        .checked_add(payload.delta)
        .filter(|stock| *stock >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(product_id = %updated.id, delta = payload.delta, stock = updated.stock, "inventory adjusted");
    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "inventory_adjust",
            "products",
            serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
        ),
    )
    .await;

    Ok(ApiResponse::item("Inventory updated", Product::from(updated)))
}
