mod common;

use pottery_commerce_api::{
    dto::cart::AddToCartRequest,
    error::AppError,
    routes::params::PageQuery,
    services::cart_service,
};

use common::{customer, insert_product, setup};

#[tokio::test]
async fn cart_is_priced_from_the_catalog() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let shopper = customer();

    let mug = insert_product(state, 1800, 5, 500).await?;
    let vase = insert_product(state, 2200, 0, 1000).await?;

    cart_service::add_to_cart(state, &shopper, AddToCartRequest { product_id: mug.id, quantity: 1 }).await?;
    // Adding again replaces the quantity.
    cart_service::add_to_cart(state, &shopper, AddToCartRequest { product_id: mug.id, quantity: 2 }).await?;
    cart_service::add_to_cart(state, &shopper, AddToCartRequest { product_id: vase.id, quantity: 1 }).await?;

    let cart = cart_service::list_cart(state, &shopper, PageQuery::default()).await?;
    let meta = cart.meta.expect("page meta");
    assert_eq!(meta.total, Some(2));
    let list = cart.data.expect("cart");
    assert_eq!(list.subtotal, 5800);
    assert_eq!(list.weight_grams, 2000);

    let mugs = list.items.iter().find(|line| line.product.id == mug.id).expect("mug line");
    assert_eq!(mugs.quantity, 2);
    assert_eq!(mugs.line_total, 3600);
    assert!(mugs.available);
    let vases = list.items.iter().find(|line| line.product.id == vase.id).expect("vase line");
    assert_eq!(vases.line_total, 2200);
    assert!(!vases.available);

    // Totals cover the whole cart even when a page shows one line.
    let first_page = cart_service::list_cart(
        state,
        &shopper,
        PageQuery { page: Some(1), per_page: Some(1) },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(first_page.items.len(), 1);
    assert_eq!(first_page.subtotal, 5800);

    cart_service::remove_from_cart(state, &shopper, vase.id).await?;
    let list = cart_service::list_cart(state, &shopper, PageQuery::default())
        .await?
        .data
        .expect("cart");
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.subtotal, 3600);

    let err = cart_service::remove_from_cart(state, &shopper, vase.id)
        .await
        .expect_err("already removed");
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn cart_quantity_must_be_within_limits() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;
    let shopper = customer();
    let mug = insert_product(state, 1800, 5, 500).await?;

    for quantity in [0, -1, 101] {
        let err = cart_service::add_to_cart(state, &shopper, AddToCartRequest { product_id: mug.id, quantity })
            .await
            .expect_err("out of range");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    let list = cart_service::list_cart(state, &shopper, PageQuery::default())
        .await?
        .data
        .expect("cart");
    assert!(list.items.is_empty());
    assert_eq!(list.subtotal, 0);
    Ok(())
}
