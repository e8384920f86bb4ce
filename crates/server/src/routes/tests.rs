//! Router tests driven through `tower::ServiceExt::oneshot` against the
//! in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use jandl_core::{Email, ProductId, StockPolicy, UserId};

use super::app;
use crate::config::ServerConfig;
use crate::db::{CatalogStore, InMemoryStore};
use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::models::{NewProduct, Product, User};
use crate::state::AppState;

const ADMIN_KEY: &str = "Qm7vX2pL9sRt4wYb";
const JWT_SECRET: &str = "k7Qm2xVz9pL4sRt8wYb3nHc6jFd1gAe5";

fn config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/jandl_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        admin_key: SecretString::from(ADMIN_KEY),
        jwt_secret: SecretString::from(JWT_SECRET),
        jwt_ttl_hours: 1,
        stock_policy: StockPolicy::Unguarded,
        static_dir: None,
        cors_allowed_origins: Vec::new(),
        sentry_dsn: None,
        sentry_environment: "test".to_string(),
        json_logs: false,
    }
}

struct TestApp {
    store: InMemoryStore,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let state = AppState::new(
            config(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        );
        Self { store, state }
    }

    fn router(&self) -> Router {
        app(self.state.clone())
    }

    async fn seed(&self, name: &str, stock: i64) -> ProductId {
        self.store
            .create_product(NewProduct {
                name: name.to_owned(),
                price: Decimal::from(1299),
                stock,
                ..NewProduct::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn stock(&self, id: ProductId) -> i64 {
        self.store.get_product(id).await.unwrap().unwrap().stock
    }

    fn token(&self, is_admin: bool) -> String {
        let user = User {
            id: UserId::generate(),
            name: None,
            email: Email::parse("staff@shop.test").unwrap(),
            is_admin,
            created_at: Utc::now(),
        };
        self.state.tokens().issue(&user).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.10")
}

fn with_body(builder: axum::http::request::Builder, body: &Value) -> Request<Body> {
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    with_body(json_request("POST", uri), body)
}

// =============================================================================
// Banner and health
// =============================================================================

#[tokio::test]
async fn test_banner_and_health() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "message": "Ecommerce API running"}));

    let (status, body) = app.send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, _) = app.send(get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();
    let response = app.router().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_list_and_show_products() {
    let app = TestApp::new();
    let first = app.seed("Classic Denim Jacket", 20).await;
    app.seed("Cotton Crewneck T-Shirt", 60).await;

    let (status, body) = app.send(get("/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Cotton Crewneck T-Shirt");
    assert_eq!(body[1]["id"], first.to_string());

    let (status, body) = app.send(get(&format!("/products/{first}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock"], 20);
    assert_eq!(body["price"], 1299.0);
}

#[tokio::test]
async fn test_show_unknown_or_malformed_is_404() {
    let app = TestApp::new();

    let (status, body) = app
        .send(get(&format!("/products/{}", ProductId::generate())))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Product not found"}));

    let (status, _) = app.send(get("/products/not-an-id")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_requires_admin() {
    let app = TestApp::new();
    let payload = json!({"name": "Baseball Cap", "price": 299, "stock": 55});

    let (status, body) = app.send(post("/products", &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let wrong_key = json_request("POST", "/products").header("x-admin-key", "nope");
    let (status, _) = app.send(with_body(wrong_key, &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = json_request("POST", "/products")
        .header("authorization", format!("Bearer {}", app.token(false)));
    let (status, body) = app.send(with_body(customer, &payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Admin access required"}));

    let (status, _) = app.send(get("/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.list_products().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let app = TestApp::new();
    let payload = json!({"name": "Wool Scarf", "price": 499, "desc": "Warm", "stock": 45});

    let request = json_request("POST", "/products").header("x-admin-key", ADMIN_KEY);
    let (status, created) = app.send(with_body(request, &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["desc"], "Warm");
    assert_eq!(created["imageUrl"], "");
    let id = created["id"].as_str().unwrap().to_owned();

    let patch = json!({"stock": 40});
    let request = json_request("PUT", &format!("/products/{id}"))
        .header("authorization", format!("Bearer {}", app.token(true)));
    let (status, updated) = app.send(with_body(request, &patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 40);
    assert_eq!(updated["name"], "Wool Scarf");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/products/{id}"))
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, _) = app.send(get(&format!("/products/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_validation() {
    let app = TestApp::new();
    let payload = json!({"name": "Belt", "price": -5});
    let request = json_request("POST", "/products").header("x-admin-key", ADMIN_KEY);

    let (status, body) = app.send(with_body(request, &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Price cannot be negative");
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_place_order_decrements_stock() {
    let app = TestApp::new();
    let id = app.seed("Running Sneakers", 25).await;

    let (status, body) = app
        .send(post(
            "/orders",
            &json!({
                "customer": {"name": "Ada", "email": "ada@example.com", "address": "1 Loop"},
                "items": [{"productId": id.to_string(), "name": "Sneakers", "price": 2499, "qty": 2}],
                "total": 4998
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["orderId"].is_string());
    assert_eq!(app.stock(id).await, 23);
}

#[tokio::test]
async fn test_place_order_with_string_qty() {
    let app = TestApp::new();
    let id = app.seed("Wool Scarf", 45).await;

    let (status, _) = app
        .send(post(
            "/orders",
            &json!({"items": [{"productId": id.to_string(), "price": 499, "qty": "3"}], "total": 1497}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock(id).await, 42);

    let (status, body) = app
        .send(post(
            "/orders",
            &json!({"items": [{"productId": id.to_string(), "qty": 1.5}]}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(app.stock(id).await, 42);
}

#[tokio::test]
async fn test_place_unlinked_order() {
    let app = TestApp::new();

    let (status, _) = app
        .send(post(
            "/orders",
            &json!({"items": [{"name": "Custom Gift Card", "price": 500, "qty": 1}], "total": 500}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let orders = crate::db::OrderStore::list_orders(&app.store).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].items[0].name.as_deref(), Some("Custom Gift Card"));
}

#[tokio::test]
async fn test_place_order_with_bad_items() {
    let app = TestApp::new();
    let id = app.seed("Raincoat", 17).await;

    let (status, body) = app
        .send(post(
            "/orders",
            &json!({"items": [
                {"productId": id.to_string(), "qty": 1},
                {"productId": "not-a-valid-id-format"},
                {"productId": null}
            ]}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid order items");
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["index"], 1);
    assert_eq!(details[0]["reason"], "invalid productId format");
    assert_eq!(details[0]["productId"], "not-a-valid-id-format");
    assert_eq!(details[1]["reason"], "missing productId");
    assert!(details[1]["item"].is_object());

    assert_eq!(app.stock(id).await, 17);
    assert_eq!(app.store.order_count().unwrap(), 0);
}

#[tokio::test]
async fn test_place_empty_order() {
    let app = TestApp::new();

    let (status, body) = app.send(post("/orders", &json!({"items": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No items in order"}));
}

#[tokio::test]
async fn test_place_order_malformed_body() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_order_write_failure_is_500() {
    let app = TestApp::new();
    let id = app.seed("Puffer Jacket", 15).await;
    app.store.fail_order_writes(true);

    let (status, body) = app
        .send(post("/orders", &json!({"items": [{"productId": id.to_string()}]})))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create order");
    assert!(body["message"].is_string());
    assert_eq!(app.stock(id).await, 15);
}

#[tokio::test]
async fn test_list_orders_is_admin_only() {
    let app = TestApp::new();
    app.send(post("/orders", &json!({"items": [{"name": "A"}], "total": 1})))
        .await;
    app.send(post("/orders", &json!({"items": [{"name": "B"}], "total": 2})))
        .await;

    let (status, _) = app.send(get("/orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/orders")
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["items"][0]["name"], "B");
    assert_eq!(orders[0]["total"], 2.0);
    assert!(orders[0]["createdAt"].is_string());
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new();
    let credentials = json!({"name": "Ada", "email": "ada@example.com", "password": "correct horse"});

    let (status, body) = app.send(post("/auth/register", &credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["userId"].is_string());

    let (status, body) = app.send(post("/auth/register", &credentials)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = app.send(post("/auth/login", &credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["isAdmin"], false);
    let token = body["token"].as_str().unwrap();
    assert!(app.state.tokens().verify(token).is_ok());
}

#[tokio::test]
async fn test_register_requires_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send(post("/auth/register", &json!({"email": "ada@example.com"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password required");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = TestApp::new();
    app.send(post(
        "/auth/register",
        &json!({"email": "ada@example.com", "password": "correct horse"}),
    ))
    .await;

    let (status, body) = app
        .send(post(
            "/auth/login",
            &json!({"email": "ada@example.com", "password": "battery staple"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_product_json_shape() {
    let app = TestApp::new();
    let product = Product {
        id: ProductId::generate(),
        name: "Leather Handbag".to_owned(),
        price: Decimal::from(1899),
        description: "Tan".to_owned(),
        stock: 10,
        image_url: "https://img.test/bag.jpg".to_owned(),
        created_at: Utc::now(),
    };
    app.store.insert_product(product.clone()).unwrap();

    let (_, body) = app.send(get(&format!("/products/{}", product.id))).await;
    for key in ["id", "name", "price", "desc", "stock", "imageUrl", "createdAt"] {
        assert!(body.get(key).is_some(), "missing {key}");
    }
}
