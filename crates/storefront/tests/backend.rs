//! Backend mode against a stub auth/database service on a local port.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{ConnectInfo, RawQuery, State},
    http::{HeaderMap, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

use lumiere_core::{OrderId, ProductId, UserId};
use lumiere_storefront::backend::{
    AuthSession, AuthUser, BackendClient, BackendError, CreateOrderParams,
};
use lumiere_storefront::catalog::{Catalog, ProductStore};
use lumiere_storefront::config::{AuthMode, BackendConfig, StorefrontConfig};
use lumiere_storefront::orders::ShippingAddress;
use lumiere_storefront::state::AppState;
use lumiere_storefront::{app, db, middleware};

const ANON_KEY: &str = "stub-anon-key";
const USER_TOKEN: &str = "stub-user-token";
const PASSWORD: &str = "bon-mot-de-passe";
const BACKEND_ORDER: i32 = 501;

// =============================================================================
// Stub service
// =============================================================================

#[derive(Default)]
struct Stub {
    product_reads: AtomicUsize,
    /// `(apikey, authorization)` of every table read.
    credentials: Mutex<Vec<(String, String)>>,
    /// Query strings of the order updates.
    order_updates: Mutex<Vec<String>>,
}

impl Stub {
    fn record(&self, headers: &HeaderMap) {
        let value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        self.credentials
            .lock()
            .unwrap()
            .push((value("apikey"), value("authorization")));
    }
}

fn wants_object(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("vnd.pgrst.object"))
}

fn no_rows() -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        Json(json!({
            "code": "PGRST116",
            "details": "The result contains 0 rows",
            "hint": null,
            "message": "JSON object requested, multiple (or no) rows returned"
        })),
    )
        .into_response()
}

fn product_row() -> Value {
    json!({
        "id": 1,
        "title": "Les Murmures du Temps",
        "author": "Marie Dubois",
        "description": "Une saga familiale.",
        "price": "24.90",
        "rating": 4.5,
        "review_count": 12,
        "tags": ["saga"],
        "is_active": true,
        "category": {"name": "Roman", "slug": "roman"},
        "inventory": [{"quantity": 10, "reserved_quantity": 0}],
        "created_at": "2026-01-15T10:00:00Z"
    })
}

fn order_row(status: &str) -> Value {
    json!({
        "id": BACKEND_ORDER,
        "order_number": "CMD-2026-0501",
        "user_id": "user-1",
        "status": status,
        "total_amount": "29.80",
        "shipping_address": {"street": "3 quai Voltaire", "city": "Lyon", "postal_code": "69002"},
        "customer_email": "lea@example.fr",
        "order_items": [{
            "product_id": 1,
            "quantity": 1,
            "unit_price": "24.90",
            "product": {"title": "Les Murmures du Temps", "author": "Marie Dubois"}
        }],
        "created_at": "2026-01-20T09:00:00Z"
    })
}

async fn token(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        )
            .into_response();
    }
    Json(json!({
        "access_token": USER_TOKEN,
        "refresh_token": "stub-refresh-token",
        "expires_in": 3600,
        "user": {"id": "user-1", "email": body["email"]}
    }))
    .into_response()
}

async fn profile() -> Json<Value> {
    Json(json!({
        "id": "user-1",
        "email": "lea@example.fr",
        "first_name": "Léa",
        "last_name": "Martin",
        "role": "customer"
    }))
}

async fn products(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    stub.product_reads.fetch_add(1, Ordering::SeqCst);
    stub.record(&headers);
    if wants_object(&headers) {
        Json(product_row()).into_response()
    } else {
        Json(json!([product_row()])).into_response()
    }
}

async fn categories() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "7")], "slow down").into_response()
}

async fn create_order_ok() -> Json<Value> {
    Json(json!(42))
}

async fn create_order_failing() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "insufficient stock"})),
    )
        .into_response()
}

async fn orders(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Json<Value> {
    stub.record(&headers);
    Json(json!([order_row("pending")]))
}

async fn update_order(State(stub): State<Arc<Stub>>, RawQuery(query): RawQuery) -> Response {
    let query = query.unwrap_or_default();
    stub.order_updates.lock().unwrap().push(query.clone());
    if query.contains(&format!("id=eq.{BACKEND_ORDER}")) && query.contains("status=eq.pending") {
        Json(order_row("cancelled")).into_response()
    } else {
        no_rows()
    }
}

fn stub_router(stub: Arc<Stub>, create_order_works: bool) -> Router {
    let create_order = if create_order_works {
        post(create_order_ok)
    } else {
        post(create_order_failing)
    };
    Router::new()
        .route("/auth/v1/token", post(token))
        .route("/rest/v1/users", get(profile))
        .route("/rest/v1/products", get(products))
        .route("/rest/v1/categories", get(categories))
        .route("/rest/v1/rpc/create_order", create_order)
        .route("/rest/v1/orders", get(orders).patch(update_order))
        .with_state(stub)
}

async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    Url::parse(&format!("http://{addr}")).unwrap()
}

fn backend_config(url: Url) -> BackendConfig {
    BackendConfig {
        url,
        anon_key: SecretString::from(ANON_KEY),
    }
}

fn user_session() -> AuthSession {
    AuthSession::new(
        USER_TOKEN.to_string(),
        "stub-refresh-token".to_string(),
        Utc::now() + Duration::hours(1),
        AuthUser {
            id: UserId::new("user-1"),
            email: Some("lea@example.fr".to_string()),
        },
    )
}

// =============================================================================
// Client
// =============================================================================

#[tokio::test]
async fn test_requests_carry_api_key_and_bearer_token() {
    let stub = Arc::new(Stub::default());
    let client = BackendClient::new(&backend_config(serve(stub_router(stub.clone(), true)).await));

    client.get_products().await.unwrap();
    client
        .get_user_orders(&UserId::new("user-1"), Some(&user_session()))
        .await
        .unwrap();

    let credentials = stub.credentials.lock().unwrap().clone();
    assert_eq!(
        credentials,
        vec![
            (ANON_KEY.to_string(), format!("Bearer {ANON_KEY}")),
            (ANON_KEY.to_string(), format!("Bearer {USER_TOKEN}")),
        ]
    );
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let url = serve(stub_router(Arc::new(Stub::default()), true)).await;
    let client = BackendClient::new(&backend_config(url));

    let err = client.get_categories().await.unwrap_err();
    assert!(matches!(err, BackendError::RateLimited(7)));
}

#[tokio::test]
async fn test_no_rows_is_not_found() {
    let url = serve(stub_router(Arc::new(Stub::default()), true)).await;
    let client = BackendClient::new(&backend_config(url));
    let session = user_session();

    let err = client
        .cancel_order(OrderId::new(7), &session.user.id, &session)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn test_catalog_is_cached_until_an_order_is_created() {
    let stub = Arc::new(Stub::default());
    let client = BackendClient::new(&backend_config(serve(stub_router(stub.clone(), true)).await));

    client.get_products().await.unwrap();
    client.get_products().await.unwrap();
    assert_eq!(stub.product_reads.load(Ordering::SeqCst), 1);

    let params = CreateOrderParams {
        order_number: "CMD-2026-0042".to_string(),
        user_id: UserId::new("user-1"),
        customer_email: "lea@example.fr".to_string(),
        items: Vec::new(),
        shipping_address: ShippingAddress {
            street: "3 quai Voltaire".to_string(),
            city: "Lyon".to_string(),
            postal_code: "69002".to_string(),
            country: "France".to_string(),
        },
        shipping_cost: Decimal::ZERO,
        total_amount: Decimal::ZERO,
    };
    let id = client.create_order(&params, &user_session()).await.unwrap();
    assert_eq!(id, OrderId::new(42));

    client.get_products().await.unwrap();
    assert_eq!(stub.product_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_catalog_falls_back_to_demo_data() {
    let failing = Router::new().fallback(|| async {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database unavailable"})),
        )
    });
    let erroring = BackendClient::new(&backend_config(serve(failing).await));

    // Nothing listens on a port once its listener is dropped
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = listener.local_addr().unwrap();
    drop(listener);
    let unreachable =
        BackendClient::new(&backend_config(Url::parse(&format!("http://{closed}")).unwrap()));

    let store = ProductStore::seeded();
    for client in [&erroring, &unreachable] {
        let catalog = Catalog::new(client, &store, AuthMode::Backend);
        assert_eq!(catalog.products().await.len(), 6);
        let book = catalog.product(ProductId::new(1)).await.unwrap();
        assert_eq!(book.title, "Les Murmures du Temps");
        assert!(!catalog.categories().await.is_empty());
    }
}

// =============================================================================
// Routes
// =============================================================================

struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    async fn backend(stub: Arc<Stub>, create_order_works: bool) -> Self {
        let url = serve(stub_router(stub, create_order_works)).await;
        let config = StorefrontConfig {
            auth_mode: AuthMode::Backend,
            backend: backend_config(url),
            ..StorefrontConfig::demo()
        };
        let pool = db::create_pool(&config.session_database_url).await.unwrap();
        let store = middleware::create_session_store(&pool).await.unwrap();
        Self {
            app: app(AppState::new(config, pool), store),
            cookie: None,
        }
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 20], 50_000))));
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

    async fn login(&mut self) -> Value {
        let (status, me) = self
            .post(
                "/auth/login",
                json!({"email": "lea@example.fr", "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        me
    }
}

#[tokio::test]
async fn test_login_maps_backend_rejections() {
    let mut client = Client::backend(Arc::new(Stub::default()), true).await;

    let (status, body) = client
        .post(
            "/auth/login",
            json!({"email": "lea@example.fr", "password": "mauvais"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email ou mot de passe incorrect");

    let me = client.login().await;
    assert_eq!(me["is_authenticated"], true);
    assert_eq!(me["is_admin"], false);
    assert_eq!(me["profile"]["first_name"], "Léa");

    // Demo shortcuts only exist in demo mode
    let (status, _) = client.post("/auth/demo/admin", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_kept_locally_when_create_rpc_fails() {
    let stub = Arc::new(Stub::default());
    let mut client = Client::backend(stub.clone(), false).await;
    client.login().await;

    let (status, _) = client
        .post("/cart/add", json!({"product_id": 1, "quantity": 1}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client
        .post(
            "/checkout/shipping",
            json!({
                "first_name": "Léa",
                "last_name": "Martin",
                "email": "lea@example.fr",
                "street": "3 quai Voltaire",
                "city": "Lyon",
                "postal_code": "69002"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, confirmation) = client
        .post(
            "/checkout/payment",
            json!({
                "card_number": "4242 4242 4242 4242",
                "expiry_date": "12/30",
                "cvv": "123",
                "card_name": "Lea Martin"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let local = confirmation["order_number"].as_str().unwrap().to_string();

    let (status, orders) = client.get("/orders").await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers.len(), 2);
    assert!(numbers.contains(&local.as_str()));
    assert!(numbers.contains(&"CMD-2026-0501"));

    let (status, order) = client.get(&format!("/orders/{local}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "pending");

    let (status, order) = client.post(&format!("/orders/{local}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");
    assert!(stub.order_updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_goes_through_the_backend() {
    let stub = Arc::new(Stub::default());
    let mut client = Client::backend(stub.clone(), true).await;
    client.login().await;

    let (status, order) = client.post("/orders/CMD-2026-0501/cancel", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");

    let updates = stub.order_updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].contains("user_id=eq.user-1"));

    let (status, _) = client.post("/orders/CMD-2099-0000/cancel", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
