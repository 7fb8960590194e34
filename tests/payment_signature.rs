use pottery_commerce_api::services::gateway::{sign_payment, verify_payment_signature};

const SECRET: &str = "test_key_secret";

fn sign(secret: &str, gateway_order_id: &str, payment_id: &str) -> String {
    sign_payment(secret, gateway_order_id, payment_id).expect("signature")
}

#[test]
fn signature_from_the_gateway_verifies() {
    let signature = sign(SECRET, "order_abc", "pay_123");
    assert!(verify_payment_signature(SECRET, "order_abc", "pay_123", &signature));
}

#[test]
fn signature_is_hex_hmac_of_order_and_payment_ids() {
    assert_eq!(
        sign(SECRET, "order_abc", "pay_123"),
        "aba246955ff7ef54d1583781e3ac8479326ddde95daf546a3c53793b286b4b82"
    );
    // Uppercase hex and stray whitespace still decode to the same bytes.
    assert!(verify_payment_signature(
        SECRET,
        "order_abc",
        "pay_123",
        " ABA246955FF7EF54D1583781E3AC8479326DDDE95DAF546A3C53793B286B4B82\n"
    ));
}

#[test]
fn empty_secret_still_signs_without_panicking() {
    let signature = sign("", "order_abc", "pay_123");
    assert_eq!(
        signature,
        "e9b79da32a1c4583023d12e25da60a3ab4c9c28bde89fd1f1f3aa24e4880c7c2"
    );
    assert!(verify_payment_signature("", "order_abc", "pay_123", &signature));
    assert!(!verify_payment_signature(SECRET, "order_abc", "pay_123", &signature));
}

#[test]
fn tampered_payment_id_is_rejected() {
    let signature = sign(SECRET, "order_abc", "pay_123");
    assert!(!verify_payment_signature(SECRET, "order_abc", "pay_999", &signature));
}

#[test]
fn signature_under_another_secret_is_rejected() {
    let signature = sign("someone_else", "order_abc", "pay_123");
    assert!(!verify_payment_signature(SECRET, "order_abc", "pay_123", &signature));
}

#[test]
fn non_hex_signature_is_rejected() {
    assert!(!verify_payment_signature(SECRET, "order_abc", "pay_123", "not-a-signature"));
    assert!(!verify_payment_signature(SECRET, "order_abc", "pay_123", ""));
}
