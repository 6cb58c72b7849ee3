//! Router tests against the full middleware stack in demo mode.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use lumiere_storefront::config::{AuthMode, StorefrontConfig};
use lumiere_storefront::state::AppState;
use lumiere_storefront::{app, db, middleware};

async fn app_with(config: StorefrontConfig) -> Router {
    let pool = db::create_pool(&config.session_database_url).await.unwrap();
    let store = middleware::create_session_store(&pool).await.unwrap();
    app(AppState::new(config, pool), store)
}

async fn test_app() -> Router {
    app_with(StorefrontConfig::demo()).await
}

/// A browser stand-in that keeps the session cookie.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    async fn new() -> Self {
        Self::with_app(test_app().await)
    }

    fn with_app(app: Router) -> Self {
        Self { app, cookie: None }
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_from(method, uri, body, None).await
    }

    /// Send with an `X-Forwarded-For` header on top of the peer address.
    async fn send_from(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        forwarded_for: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 50_000))));
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let response = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn test_catalog() {
    let mut client = Client::new().await;

    let (status, list) = client.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 6);

    let (status, book) = client.get("/products/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["title"], "Les Murmures du Temps");
    assert_eq!(book["in_stock"], true);

    let (status, body) = client.get("/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, results) = client.get("/search?q=murmures").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = results["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| &p["id"])
        .collect();
    assert!(ids.contains(&&json!(1)));
}

#[tokio::test]
async fn test_cart_lives_in_the_session() {
    let mut client = Client::new().await;

    let (status, cart) = client
        .post("/cart/add", json!({"product_id": 1, "quantity": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], 2);

    client.post("/cart/add", json!({"product_id": 2})).await;
    let (_, count) = client.get("/cart/count").await;
    assert_eq!(count["count"], 3);

    let (status, _) = client
        .post("/cart/add", json!({"product_id": 4, "quantity": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .post("/cart/add", json!({"product_id": 1, "quantity": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = client
        .post("/cart/update", json!({"product_id": 1, "quantity": 0}))
        .await;
    assert_eq!(cart["total_items"], 1);

    let (_, cart) = client.post("/cart/clear", json!({})).await;
    assert_eq!(cart["total_items"], 0);
}

#[tokio::test]
async fn test_protected_routes_require_sign_in() {
    let mut client = Client::new().await;

    let (status, _) = client.get("/orders").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client.get("/checkout").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = client.get("/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_authenticated"], false);
}

#[tokio::test]
async fn test_demo_customer_checkout() {
    let mut client = Client::new().await;

    let (status, me) = client.post("/auth/demo/customer", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_authenticated"], true);
    assert_eq!(me["is_admin"], false);

    let (_, orders) = client.get("/orders").await;
    let before = orders.as_array().unwrap().len();

    // Empty cart cannot leave step 1
    let shipping = json!({
        "first_name": "Client",
        "last_name": "Demo",
        "email": "client@email.com",
        "street": "1 rue de la Paix",
        "city": "Paris",
        "postal_code": "75002"
    });
    let (status, _) = client.post("/checkout/shipping", shipping.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    client
        .post("/cart/add", json!({"product_id": 3, "quantity": 1}))
        .await;

    let (status, view) = client.get("/checkout").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "shipping");

    let (status, view) = client.post("/checkout/shipping", shipping).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "payment");

    let (status, _) = client
        .post("/checkout/payment", json!({"card_number": "4242"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, confirmation) = client
        .post(
            "/checkout/payment",
            json!({
                "card_number": "4242 4242 4242 4242",
                "expiry_date": "12/30",
                "cvv": "123",
                "card_name": "Client Demo"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let number = confirmation["order_number"].as_str().unwrap().to_string();
    assert!(number.starts_with("CMD-"));
    assert!(confirmation["order_id"].is_u64());

    let (_, count) = client.get("/cart/count").await;
    assert_eq!(count["count"], 0);

    let (_, orders) = client.get("/orders").await;
    assert_eq!(orders.as_array().unwrap().len(), before + 1);

    let (status, order) = client.get(&format!("/orders/{number}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["can_cancel"], true);

    let (status, order) = client.post(&format!("/orders/{number}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");

    let (status, _) = client.post(&format!("/orders/{number}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_logout_keeps_the_cart() {
    let mut client = Client::new().await;

    client.post("/auth/demo/customer", json!({})).await;
    client.post("/cart/add", json!({"product_id": 1})).await;

    let (status, me) = client.post("/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_authenticated"], false);

    let (_, count) = client.get("/cart/count").await;
    assert_eq!(count["count"], 1);

    let (status, _) = client.get("/wishlist").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_demo_account() {
    let mut client = Client::new().await;
    client.post("/auth/demo/customer", json!({})).await;

    let (status, profile) = client.get("/account/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["first_name"], "Client");

    let (status, _) = client.get("/account/addresses").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, wishlist) = client.get("/wishlist").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wishlist["stats"]["count"], 4);
}

#[tokio::test]
async fn test_admin_panel() {
    let mut client = Client::new().await;

    client.post("/auth/demo/customer", json!({})).await;
    let (status, _) = client.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, me) = client.post("/auth/demo/admin", json!({})).await;
    assert_eq!(me["is_admin"], true);

    let (status, dashboard) = client.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["orders"]["total"], 7);

    let (status, _) = client.get("/admin/orders?status=teleported").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = client
        .post(
            "/admin/products",
            json!({
                "title": "Les Nuits Blanches",
                "author": "Fiodor Dostoïevski",
                "price": "12.90",
                "category": "Roman",
                "quantity": 8
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 7);

    let (status, toggled) = client
        .post("/admin/products/7/toggle-active", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    let (status, _) = client.get("/products/7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_form() {
    let mut client = Client::new().await;

    let (status, body) = client
        .post(
            "/contact",
            json!({
                "name": "Jeanne",
                "email": "jeanne@example.fr",
                "subject": "bulk",
                "message": "Bonjour, je souhaite commander 40 exemplaires."
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = client
        .post("/contact", json!({"name": "Jeanne", "email": "jeanne"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_demo_session_is_rejected_outside_demo_mode() {
    let config = StorefrontConfig::demo();
    let pool = db::create_pool(&config.session_database_url).await.unwrap();
    let store = middleware::create_session_store(&pool).await.unwrap();
    let demo = app(AppState::new(config.clone(), pool.clone()), store.clone());
    let backend = app(
        AppState::new(
            StorefrontConfig {
                auth_mode: AuthMode::Backend,
                ..config
            },
            pool,
        ),
        store,
    );

    let mut client = Client::with_app(demo);
    let (_, me) = client.post("/auth/demo/admin", json!({})).await;
    assert_eq!(me["is_admin"], true);

    // Same session store, restarted in backend mode
    client.app = backend;
    let (status, _) = client.get("/admin/dashboard").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = client.get("/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_authenticated"], false);
    assert_eq!(me["is_admin"], false);
}

#[tokio::test]
async fn test_add_all_to_cart_skips_what_the_catalog_cannot_sell() {
    let app = test_app().await;
    let mut admin = Client::with_app(app.clone());
    let mut customer = Client::with_app(app);

    admin.post("/auth/demo/admin", json!({})).await;
    let (status, hidden) = admin
        .post("/admin/products/1/toggle-active", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hidden["is_active"], false);

    // Saved: 1 (now hidden), 2, 4 (out of stock), 5
    customer.post("/auth/demo/customer", json!({})).await;
    let (status, result) = customer
        .post("/wishlist/add-all-to-cart", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["added"], 2);
    assert_eq!(result["skipped"], json!([1, 4]));
    assert_eq!(result["cart"]["total_items"], 2);

    let (status, _) = customer.post("/wishlist/1/cart", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn contact_from(client: &mut Client, ip: &str) -> StatusCode {
    let body = json!({"name": "Jeanne", "email": "jeanne"});
    client
        .send_from(Method::POST, "/contact", Some(body), Some(ip))
        .await
        .0
}

#[tokio::test]
async fn test_forwarded_for_cannot_dodge_the_rate_limit() {
    let mut client = Client::new().await;

    for n in 1..=5 {
        let status = contact_from(&mut client, &format!("198.51.100.{n}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let status = contact_from(&mut client, "198.51.100.6").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_trusted_proxy_keys_on_forwarded_for() {
    let config = StorefrontConfig {
        trust_proxy: true,
        ..StorefrontConfig::demo()
    };
    let mut client = Client::with_app(app_with(config).await);

    for n in 1..=6 {
        let status = contact_from(&mut client, &format!("198.51.100.{n}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    for _ in 0..5 {
        contact_from(&mut client, "198.51.100.1").await;
    }
    let status = contact_from(&mut client, "198.51.100.1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
