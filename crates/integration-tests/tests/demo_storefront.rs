//! Demo-mode flows against a running storefront.
//!
//! These tests require the storefront running in demo mode with no
//! payment delay:
//!
//! ```bash
//! LUMIERE_AUTH_MODE=demo LUMIERE_PAYMENT_DELAY_MS=0 cargo run -p lumiere-storefront
//! ```

use lumiere_integration_tests::{session_client, storefront_base_url};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn post_json(client: &Client, path: &str, body: &Value) -> (StatusCode, Value) {
    let resp = client
        .post(format!("{}{path}", storefront_base_url()))
        .json(body)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(client: &Client, path: &str) -> (StatusCode, Value) {
    let resp = client
        .get(format!("{}{path}", storefront_base_url()))
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
#[ignore = "Requires a running storefront in demo mode"]
async fn test_health() {
    let resp = session_client()
        .get(format!("{}/health/ready", storefront_base_url()))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires a running storefront in demo mode"]
async fn test_cart_survives_between_requests() {
    let client = session_client();

    let (status, _) = post_json(&client, "/cart/add", &json!({"product_id": 1, "quantity": 2})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, count) = get_json(&client, "/cart/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 2);

    let (_, cart) = post_json(&client, "/cart/clear", &json!({})).await;
    assert_eq!(cart["total_items"], 0);
}

#[tokio::test]
#[ignore = "Requires a running storefront in demo mode"]
async fn test_demo_customer_checkout() {
    let client = session_client();

    let (status, me) = post_json(&client, "/auth/demo/customer", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_authenticated"], true);

    post_json(&client, "/cart/add", &json!({"product_id": 2})).await;

    let (status, view) = post_json(
        &client,
        "/checkout/shipping",
        &json!({
            "first_name": "Client",
            "last_name": "Demo",
            "email": "client@email.com",
            "street": "1 rue de la Paix",
            "city": "Paris",
            "postal_code": "75002"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "payment");

    let (status, confirmation) = post_json(
        &client,
        "/checkout/payment",
        &json!({
            "card_number": "4242 4242 4242 4242",
            "expiry_date": "12/30",
            "cvv": "123",
            "card_name": "Client Demo"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let number = confirmation["order_number"].as_str().unwrap_or_default();
    assert!(number.starts_with("CMD-"));

    let (_, orders) = get_json(&client, "/orders").await;
    let found = orders
        .as_array()
        .is_some_and(|list| list.iter().any(|o| o["order_number"] == number));
    assert!(found);
}

#[tokio::test]
#[ignore = "Requires a running storefront in demo mode"]
async fn test_admin_requires_admin_profile() {
    let client = session_client();

    let (status, _) = get_json(&client, "/admin/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    post_json(&client, "/auth/demo/customer", &json!({})).await;
    let (status, _) = get_json(&client, "/admin/dashboard").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    post_json(&client, "/auth/demo/admin", &json!({})).await;
    let (status, dashboard) = get_json(&client, "/admin/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert!(dashboard["orders"]["total"].as_u64().unwrap_or(0) >= 7);
}
