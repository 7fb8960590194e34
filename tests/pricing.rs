use pottery_commerce_api::{
    models::StoreSettings,
    services::pricing::{PricedLine, calculate, shipping_cost, tax_for},
};

fn settings() -> StoreSettings {
    StoreSettings::defaults("INR")
}

fn line(unit_price: i64, quantity: i32, weight_grams: i32) -> PricedLine {
    PricedLine {
        unit_price,
        quantity,
        weight_grams,
    }
}

#[test]
fn two_kilogram_cart_is_priced_with_one_extra_kilogram() {
    let quote = calculate(&[line(1800, 2, 500), line(2200, 1, 1000)], &settings(), 0);

    assert_eq!(quote.subtotal, 5800);
    assert_eq!(quote.weight_grams, 2000);
    assert_eq!(quote.shipping_cost, 90);
    assert_eq!(quote.tax, 696);
    assert_eq!(quote.discount, 0);
    assert_eq!(quote.total, 6586);
    assert!(quote.is_consistent());
}

#[test]
fn shipping_is_free_at_the_threshold() {
    let settings = settings();
    assert_eq!(shipping_cost(10_000, 25_000, &settings), 0);
    assert_eq!(shipping_cost(9_999, 500, &settings), 50);
}

#[test]
fn base_rate_covers_the_first_kilogram() {
    let settings = settings();
    assert_eq!(shipping_cost(100, 0, &settings), 50);
    assert_eq!(shipping_cost(100, 1_000, &settings), 50);
    assert_eq!(shipping_cost(100, 1_001, &settings), 90);
    assert_eq!(shipping_cost(100, 3_000, &settings), 130);
}

#[test]
fn tax_rounds_to_whole_units() {
    assert_eq!(tax_for(5800, 12.0), 696);
    assert_eq!(tax_for(1005, 10.0), 101);
    assert_eq!(tax_for(0, 12.0), 0);
}

#[test]
fn discount_never_exceeds_subtotal() {
    let quote = calculate(&[line(500, 1, 200)], &settings(), 10_000);

    assert_eq!(quote.discount, 500);
    assert!(quote.is_consistent());
}
