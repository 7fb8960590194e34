use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    ActiveValue::NotSet,
    sea_query::{Expr, LockType, extension::postgres::PgExpr},
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    dto::{
        orders::LineItemRequest,
        products::{CreateProductRequest, ProductList},
    },
    entity::products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::ApiResponse,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::pricing::PricedLine,
    state::AppState,
};

/// Live catalog values a checkout is priced and reserved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub weight_grams: i32,
}

impl From<ProductModel> for ProductSnapshot {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            image_url: model.image_url,
            price: model.price,
            stock: model.stock,
            weight_grams: model.weight_grams,
        }
    }
}

/// Resolve product ids to snapshots, in the order requested.
///
/// With `lock` the rows are taken `FOR UPDATE` in id order, so concurrent
/// checkouts touching the same products queue instead of deadlocking.
pub async fn load_snapshots<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
    lock: bool,
) -> AppResult<Vec<ProductSnapshot>> {
    let mut finder = Products::find()
        .filter(ProdCol::Id.is_in(ids.iter().copied()))
        .order_by_asc(ProdCol::Id);
    if lock {
        finder = finder.lock(LockType::Update);
    }
    let rows = finder.all(conn).await?;

    ids.iter()
        .map(|id| {
            rows.iter()
                .find(|row| row.id == *id)
                .cloned()
                .map(ProductSnapshot::from)
                .ok_or(AppError::ProductNotFound(*id))
        })
        .collect()
}

/// Pair requested quantities with catalog prices and weights.
pub fn priced_lines(items: &[LineItemRequest], snapshots: &[ProductSnapshot]) -> Vec<PricedLine> {
    items
        .iter()
        .zip(snapshots)
        .map(|(item, snapshot)| PricedLine {
            unit_price: snapshot.price,
            quantity: item.quantity,
            weight_grams: snapshot.weight_grams,
        })
        .collect()
}

/// First line whose requested quantity exceeds current stock.
pub fn ensure_stock(items: &[LineItemRequest], snapshots: &[ProductSnapshot]) -> AppResult<()> {
    for (item, snapshot) in items.iter().zip(snapshots) {
        if snapshot.stock < item.quantity {
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

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }
    if query.in_stock.unwrap_or(false) {
        condition = condition.add(ProdCol::Stock.gt(0));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };
    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::page("Products", ProductList { items }, page, limit, total))
}

pub async fn get_product_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let product = Products::find()
        .filter(ProdCol::Slug.eq(slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::item("Product", Product::from(product)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let slug = payload.slug.trim().to_lowercase();
    let taken = Products::find()
        .filter(ProdCol::Slug.eq(slug.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::BadRequest(format!("slug '{slug}' is already used")));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        price: Set(payload.price),
        stock: Set(payload.stock),
        weight_grams: Set(payload.weight_grams),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        AuditEntry::new(
            Some(user.user_id),
            "product_create",
            "products",
            serde_json::json!({ "product_id": product.id }),
        ),
    )
    .await;

    Ok(ApiResponse::item("Product created", Product::from(product)))
}
