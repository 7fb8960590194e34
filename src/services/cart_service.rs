use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    ActiveValue::NotSet,
    sea_query::OnConflict,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::cart::{AddToCartRequest, CartLine, CartList},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::ApiResponse,
    routes::params::PageQuery,
    state::AppState,
};

const MAX_CART_QUANTITY: i32 = 100;

/// List the cart priced at today's catalog prices.
///
/// A cart is capped per line and small, so every line is loaded to total it
/// and the page is cut afterwards.
pub async fn list_cart(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let lines: Vec<CartLine> = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_desc(CartCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(line, product)| {
            product.map(|product| CartLine::new(line.id, Product::from(product), line.quantity))
        })
        .collect();

    let total = lines.len() as i64;
    let subtotal: i64 = lines.iter().map(|line| line.line_total).sum();
    let weight_grams: i64 = lines.iter().map(CartLine::weight_grams).sum();
    let items = lines
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    Ok(ApiResponse::page(
        "Cart",
        CartList {
            items,
            subtotal,
            weight_grams,
        },
        page,
        limit,
        total,
    ))
}

/// Set the quantity of a product in the cart, adding the line if needed.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 || payload.quantity > MAX_CART_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_CART_QUANTITY}"
        )));
    }
    Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound(payload.product_id))?;

    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
        created_at: NotSet,
    };
    CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::ProductId])
                .update_column(CartCol::Quantity)
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    let line = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(payload.product_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "cart_update",
            "cart_items",
            json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
        ),
    )
    .await;

    Ok(ApiResponse::item("Cart updated", CartItem::from(line)))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "cart_remove",
            "cart_items",
            json!({ "product_id": product_id }),
        ),
    )
    .await;

    Ok(ApiResponse::item("Removed from cart", json!({ "product_id": product_id })))
}
