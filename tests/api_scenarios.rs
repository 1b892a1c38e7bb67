//! End-to-end HTTP scenarios driven through the full router in-process.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use kiakart_backend::{
    api::{create_router, AppState, RouterConfig},
    auth::{api::AuthState, password, JwtHandler, PasswordHasher, VendorStore},
    catalog::CatalogStore,
    db::Database,
    middleware::{RateLimitConfig, RateLimitLayer},
    uploads::UploadStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "kiakart-test-boundary";

struct TestApp {
    router: Router,
    jwt: Arc<JwtHandler>,
    upload_dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_body_limit(1024 * 1024)
    }

    fn with_body_limit(max_body_bytes: usize) -> Self {
        let upload_dir = TempDir::new().unwrap();
        let db = Database::in_memory().unwrap();
        let vendors = VendorStore::new(db.clone(), PasswordHasher::new(password::MIN_COST)).unwrap();
        let jwt = Arc::new(JwtHandler::new("scenario-test-secret-0123456789abcdef").unwrap());

        let state = AppState {
            auth: AuthState::new(Arc::new(vendors), jwt.clone()),
            catalog: Arc::new(CatalogStore::new(db)),
            uploads: Arc::new(UploadStore::new(upload_dir.path()).unwrap()),
        };
        let router = create_router(
            state,
            RouterConfig {
                max_body_bytes,
                auth_limiter: RateLimitLayer::new(RateLimitConfig::new(
                    1_000,
                    Duration::from_secs(60),
                )),
            },
        );

        Self {
            router,
            jwt,
            upload_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn register(&self, email: &str) -> (StatusCode, Value) {
        let body = json!({
            "email": email,
            "password": "Test123!",
            "name": "Test Vendor",
            "business_name": "Test Business",
            "phone": "555-0100",
        });
        self.send(json_request(Method::POST, "/api/auth/register", None, &body))
            .await
    }

    /// Register and return the bearer token
    async fn vendor(&self, email: &str) -> String {
        let (status, body) = self.register(email).await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn create_widget(&self, token: &str) -> Value {
        let (status, body) = self
            .send(form_request(
                Method::POST,
                "/api/products",
                token,
                &[
                    ("name", "Widget"),
                    ("price", "10.0"),
                    ("description", "A very useful widget"),
                    ("quantity", "5"),
                    ("category", "Tools"),
                ],
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn form_request(method: Method, uri: &str, token: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let encoded = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(encoded))
        .unwrap()
}

fn multipart_request(
    method: Method,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn bodyless(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn widget_flow_generates_scoped_enriched_orders() {
    let app = TestApp::new();
    let token = app.vendor("v1@test.com").await;

    let (status, profile) = app.send(get("/api/vendor/profile", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "v1@test.com");
    assert!(profile.get("password_hash").is_none());

    let widget = app.create_widget(&token).await;
    assert_eq!(widget["vendor_id"], profile["id"]);

    let (status, products) = app.send(get("/api/products", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Widget");
    assert_eq!(products[0]["vendor_id"], profile["id"]);

    let (status, generated) = app
        .send(bodyless(Method::POST, "/api/generate-sample-orders", &token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let count = generated["count"].as_u64().unwrap();
    assert!((10..=15).contains(&count));
    assert_eq!(
        generated["message"],
        format!("Generated {} sample orders successfully", count)
    );

    let (status, orders) = app.send(get("/api/orders", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len() as u64, count);
    for order in orders {
        assert_eq!(order["product_id"], widget["id"]);
        assert_eq!(order["product_name"], "Widget");
        let quantity = order["quantity"].as_f64().unwrap();
        assert_eq!(order["total_price"].as_f64().unwrap(), 10.0 * quantity);
        assert!((1.0..=5.0).contains(&quantity));
    }
}

#[tokio::test]
async fn sample_orders_without_products_is_rejected() {
    let app = TestApp::new();
    let token = app.vendor("empty@test.com").await;

    let (status, body) = app
        .send(bodyless(Method::POST, "/api/generate-sample-orders", &token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No products found. Add some products first.");

    let (status, orders) = app.send(get("/api/orders", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders, json!([]));
}

#[tokio::test]
async fn expired_token_is_rejected_everywhere() {
    let app = TestApp::new();
    let (_, registered) = app.register("v1@test.com").await;
    let vendor_id = Uuid::parse_str(registered["vendor"]["id"].as_str().unwrap()).unwrap();

    let expired = app
        .jwt
        .generate_token_expiring_at(vendor_id, Utc::now() - ChronoDuration::seconds(1))
        .unwrap();

    let product_uri = format!("/api/products/{}", Uuid::new_v4());
    let requests = vec![
        get("/api/vendor/profile", &expired),
        get("/api/products", &expired),
        form_request(Method::POST, "/api/products", &expired, &[("name", "Widget")]),
        get(&product_uri, &expired),
        form_request(Method::PUT, &product_uri, &expired, &[("price", "1")]),
        bodyless(Method::DELETE, &product_uri, &expired),
        get("/api/orders", &expired),
        bodyless(Method::POST, "/api/generate-sample-orders", &expired),
        bodyless(Method::POST, "/api/auth/logout", &expired),
    ];

    for request in requests {
        let uri = request.uri().clone();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["detail"], "Token expired", "{}", uri);
    }
}

#[tokio::test]
async fn other_vendors_products_look_absent() {
    let app = TestApp::new();
    let v1 = app.vendor("v1@test.com").await;
    let v2 = app.vendor("v2@test.com").await;

    let product = app.create_widget(&v1).await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    let (status, listed) = app.send(get("/api/products", &v2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));

    let (status, body) = app.send(get(&uri, &v2)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Product not found");

    let (status, _) = app
        .send(form_request(Method::PUT, &uri, &v2, &[("name", "Stolen")]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(bodyless(Method::DELETE, &uri, &v2)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // v2's sample orders never show up for v1, and v2 has no products to order
    let (status, _) = app
        .send(bodyless(Method::POST, "/api/generate-sample-orders", &v2))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unchanged) = app.send(get(&uri, &v1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged, product);
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let app = TestApp::new();
    app.vendor("v1@test.com").await;

    let (status, body) = app.register("V1@Test.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = TestApp::new();
    app.vendor("v1@test.com").await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            &json!({ "email": "v1@test.com", "password": "Test123!" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["vendor"]["email"], "v1@test.com");

    let (wrong_status, wrong_body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            &json!({ "email": "v1@test.com", "password": "wrong-password" }),
        ))
        .await;
    let (unknown_status, unknown_body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            &json!({ "email": "nobody@test.com", "password": "Test123!" }),
        ))
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["detail"], "Invalid credentials");
}

#[tokio::test]
async fn registration_input_is_validated() {
    let app = TestApp::new();
    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            &json!({
                "email": "v1@test.com",
                "password": "short",
                "name": "V",
                "business_name": "B",
                "phone": "1",
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_credential_bodies_get_json_detail() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/register",
            None,
            &json!({ "email": "a@b.com", "password": "12345678" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("name"), "{}", body);

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            None,
            &json!({ "email": "a@b.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("password"), "{}", body);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert!(status.is_client_error());
    assert!(body["detail"].is_string(), "{}", body);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let app = TestApp::with_body_limit(4 * 1024);
    let token = app.vendor("v1@test.com").await;
    let image = vec![0u8; 16 * 1024];

    let (status, body) = app
        .send(multipart_request(
            Method::POST,
            "/api/products",
            &token,
            &[
                ("name", "Widget"),
                ("price", "10.0"),
                ("description", "A very useful widget"),
                ("quantity", "5"),
                ("category", "Tools"),
            ],
            &[("big.png", &image[..])],
        ))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{}", body);
    assert_eq!(body["detail"], "Request body too large");

    let (_, products) = app.send(get("/api/products", &token)).await;
    assert_eq!(products, json!([]));
    assert_eq!(std::fs::read_dir(app.upload_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::new();
    let token = app.vendor("v1@test.com").await;

    let (status, _) = app.send(bodyless(Method::POST, "/api/auth/logout", &token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(get("/api/vendor/profile", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token");
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = TestApp::new();
    let token = app.vendor("v1@test.com").await;
    let product = app.create_widget(&token).await;
    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

    tokio::time::sleep(Duration::from_millis(2)).await;
    let (status, updated) = app
        .send(form_request(Method::PUT, &uri, &token, &[("price", "12.5")]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 12.5);
    for field in ["name", "description", "quantity", "category", "images", "created_at"] {
        assert_eq!(updated[field], product[field], "{}", field);
    }
    assert_ne!(updated["updated_at"], product["updated_at"]);

    let (status, _) = app
        .send(form_request(Method::PUT, &uri, &token, &[("price", "-1")]))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, deleted) = app.send(bodyless(Method::DELETE, &uri, &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Product deleted successfully");

    let (status, _) = app.send(get(&uri, &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn images_are_stored_served_and_replaced() {
    let app = TestApp::new();
    let token = app.vendor("v1@test.com").await;
    let fields = [
        ("name", "Widget"),
        ("price", "10.0"),
        ("description", "A very useful widget"),
        ("quantity", "5"),
        ("category", "Tools"),
    ];

    let (status, product) = app
        .send(multipart_request(
            Method::POST,
            "/api/products",
            &token,
            &fields,
            &[("front.PNG", &b"front-bytes"[..]), ("back.png", &b"back-bytes"[..])],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", product);

    let images: Vec<String> = serde_json::from_value(product["images"].clone()).unwrap();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|p| p.starts_with("/uploads/") && p.ends_with(".png")));

    // Static files need no token
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&images[0]).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&served[..], b"front-bytes");

    let uri = format!("/api/products/{}", product["id"].as_str().unwrap());
    let (status, updated) = app
        .send(multipart_request(
            Method::PUT,
            &uri,
            &token,
            &[],
            &[("new.jpg", &b"new-bytes"[..])],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    let new_images: Vec<String> = serde_json::from_value(updated["images"].clone()).unwrap();
    assert_eq!(new_images.len(), 1);
    assert!(new_images[0].ends_with(".jpg"));
    assert_eq!(updated["name"], "Widget");

    let old_name = images[0].trim_start_matches("/uploads/");
    assert!(!app.upload_dir.path().join(old_name).exists());
}

#[tokio::test]
async fn orders_listing_is_newest_first() {
    let app = TestApp::new();
    let token = app.vendor("v1@test.com").await;
    app.create_widget(&token).await;
    app.send(bodyless(Method::POST, "/api/generate-sample-orders", &token))
        .await;

    let (_, orders) = app.send(get("/api/orders", &token)).await;
    let stamps: Vec<chrono::DateTime<Utc>> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|o| serde_json::from_value(o["created_at"].clone()).unwrap())
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
}
