use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    ActiveValue::NotSet,
    sea_query::OnConflict,
};
use uuid::Uuid;

use pottery_commerce_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{products, workshop_sessions, workshops},
    middleware::auth::{ROLE_ADMIN, ROLE_CUSTOMER, issue_token},
    services::settings_service,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = orm_from_pool(&pool);
    run_migrations(&orm).await?;

    settings_service::get_or_create(&orm, &config.store_currency).await?;
    seed_products(&orm).await?;
    seed_workshop(&orm).await?;

    let ttl = Duration::days(30);
    let admin_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();
    let admin_token = issue_token(&config.jwt_secret, admin_id, ROLE_ADMIN, Some("studio@example.com"), ttl)?;
    let customer_token =
        issue_token(&config.jwt_secret, customer_id, ROLE_CUSTOMER, Some("customer@example.com"), ttl)?;

    println!("Seed completed.");
    println!("Admin token ({admin_id}):\n{admin_token}");
    println!("Customer token ({customer_id}):\n{customer_token}");
    pool.close().await;
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    // (name, slug, description, price, stock, weight in grams)
    let catalog = [
        ("Speckled Mug", "speckled-mug", "Wheel-thrown stoneware mug, 350 ml", 1200, 24, 450),
        ("Celadon Bowl", "celadon-bowl", "Serving bowl in a pale celadon glaze", 2400, 10, 900),
        ("Tall Vase", "tall-vase", "Hand-built vase with a carved surface", 4500, 4, 1800),
        ("Dinner Plate Set", "dinner-plate-set", "Four matte stoneware plates", 6200, 6, 3200),
        ("Bud Vase", "bud-vase", "Small porcelain bud vase", 800, 30, 200),
    ];

    for (name, slug, description, price, stock, weight_grams) in catalog {
        products::Entity::insert(products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(Some(description.to_string())),
            image_url: Set(None),
            price: Set(price),
            stock: Set(stock),
            weight_grams: Set(weight_grams),
            created_at: NotSet,
            updated_at: NotSet,
        })
        .on_conflict(OnConflict::column(products::Column::Slug).do_nothing().to_owned())
        .do_nothing()
        .exec(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_workshop(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let slug = "wheel-throwing-basics";
    workshops::Entity::insert(workshops::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Wheel Throwing Basics".to_string()),
        slug: Set(slug.to_string()),
        description: Set(Some("Centre, open and pull your first cylinders.".to_string())),
        price: Set(3500),
        duration_minutes: Set(180),
        created_at: NotSet,
    })
    .on_conflict(OnConflict::column(workshops::Column::Slug).do_nothing().to_owned())
    .do_nothing()
    .exec(orm)
    .await?;

    let workshop = workshops::Entity::find()
        .filter(workshops::Column::Slug.eq(slug))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("workshop {slug} missing after insert"))?;

    let existing = workshop_sessions::Entity::find()
        .filter(workshop_sessions::Column::WorkshopId.eq(workshop.id))
        .one(orm)
        .await?;
    if existing.is_some() {
        println!("Workshop sessions already present");
        return Ok(());
    }

    for days_ahead in [3, 10, 17] {
        workshop_sessions::Entity::insert(workshop_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            workshop_id: Set(workshop.id),
            starts_at: Set((Utc::now() + Duration::days(days_ahead)).into()),
            spots_total: Set(8),
            spots_booked: Set(0),
            created_at: NotSet,
        })
        .exec(orm)
        .await?;
    }

    println!("Seeded workshop with sessions");
    Ok(())
}
