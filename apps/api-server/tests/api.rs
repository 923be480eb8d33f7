//! HTTP-level tests: the full router against an in-memory database.

use std::sync::{Arc, Mutex};

use apotheca_api::{build_app, ApiConfig, AppState};
use apotheca_core::Role;
use apotheca_db::password::hash_password;
use apotheca_db::{Database, DbConfig};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "secret123";

struct TestApp {
    router: Router,
    admin_token: String,
    pharm_token: String,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(ApiConfig::default()).await
    }

    async fn with_config(config: ApiConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let hash = hash_password(PASSWORD).unwrap();
        db.users()
            .insert("admin", &hash, "Ada Admin", Role::Admin)
            .await
            .unwrap();
        db.users()
            .insert("pharm", &hash, "Pat Pharmacist", Role::Pharmacist)
            .await
            .unwrap();

        let router = build_app(AppState::new(db, config).unwrap());
        let mut app = TestApp {
            router,
            admin_token: String::new(),
            pharm_token: String::new(),
        };
        app.admin_token = app.login("admin").await;
        app.pharm_token = app.login("pharm").await;
        app
    }

    async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.admin_token.clone();
        self.call(method, uri, Some(&token), body).await
    }

    async fn pharm(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.pharm_token.clone();
        self.call(method, uri, Some(&token), body).await
    }

    /// Creates a drug as admin and returns its id.
    async fn create_drug(&self, code: &str, price_cents: i64, stock: i64) -> String {
        let (status, body) = self
            .admin(Method::POST, "/api/drugs", Some(drug_json(code, price_cents, stock)))
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn drug(&self, id: &str) -> Value {
        let (status, body) = self
            .pharm(Method::GET, &format!("/api/drugs/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"].clone()
    }
}

fn drug_json(code: &str, price_cents: i64, stock: i64) -> Value {
    json!({
        "code": code,
        "name": format!("Drug {}", code),
        "category": "Antibiotic",
        "manufacturer": "Acme",
        "priceCents": price_cents,
        "stock": stock,
        "minStockThreshold": 5,
        "expiryDate": "2030-01-01"
    })
}

fn assert_failure(body: &Value) {
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "connected");
    assert_eq!(body["data"]["users"], 2);
    assert_eq!(body["data"]["drugs"], 0);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    for (method, uri) in [
        (Method::GET, "/api/drugs"),
        (Method::GET, "/api/sales"),
        (Method::GET, "/api/stats"),
        (Method::GET, "/api/users/me"),
    ] {
        let (status, body) = app.call(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_failure(&body);
    }

    let (status, _) = app
        .call(Method::GET, "/api/drugs", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_invalid_argument() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/sales")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.pharm_token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"items\": [oops"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body);

    let (status, body) = app
        .pharm(Method::GET, "/api/sales?limit=lots", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body);
}

#[tokio::test]
async fn sale_decrements_stock_and_rejects_oversell() {
    let app = TestApp::new().await;
    let id = app.create_drug("D100", 1250, 10).await;

    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/sales",
            Some(json!({ "items": [{ "drugId": id, "quantity": 3 }], "customerName": "Walk-in" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["totalCents"], 3 * 1250);
    assert_eq!(body["data"]["items"][0]["unitPriceCents"], 1250);
    assert_eq!(body["data"]["cashierName"], "Pat Pharmacist");
    assert_eq!(app.drug(&id).await["stock"], 7);

    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/sales",
            Some(json!({ "items": [{ "drugId": id, "quantity": 8 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_failure(&body);
    assert_eq!(app.drug(&id).await["stock"], 7);

    let (_, body) = app.pharm(Method::GET, "/api/sales", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app.pharm(Method::GET, "/api/stats", None).await;
    assert_eq!(body["data"]["totalSales"], 1);
    assert_eq!(body["data"]["totalRevenueCents"], 3750);
    assert_eq!(body["data"]["totalProducts"], 1);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .pharm(Method::POST, "/api/sales", Some(json!({ "items": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body);
}

#[tokio::test]
async fn sale_lookup_by_id() {
    let app = TestApp::new().await;
    let id = app.create_drug("D200", 500, 4).await;

    let (_, body) = app
        .pharm(
            Method::POST,
            "/api/sales",
            Some(json!({ "items": [{ "drugId": id, "quantity": 2 }] })),
        )
        .await;
    let sale_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .pharm(Method::GET, &format!("/api/sales/{}", sale_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 2);
    assert!(body["data"]["customerName"].is_null());

    let (status, _) = app.pharm(Method::GET, "/api/sales/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn batch_delete_skips_locked_drugs() {
    let app = TestApp::new().await;
    let a = app.create_drug("A001", 100, 10).await;
    let b = app.create_drug("B001", 100, 10).await;

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/drugs/{}", b),
            Some(json!({ "action": "toggleLock" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isLocked"], true);

    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/drugs/batch-delete",
            Some(json!({ "ids": [a, b] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
    assert_eq!(body["data"]["skippedLocked"], 1);

    assert_eq!(app.drug(&a).await["isDeleted"], true);
    assert_eq!(app.drug(&b).await["isDeleted"], false);

    let (_, body) = app.pharm(Method::GET, "/api/drugs?deleted=true", None).await;
    let bin = body["data"].as_array().unwrap();
    assert_eq!(bin.len(), 1);
    assert_eq!(bin[0]["code"], "A001");
    assert_eq!(bin[0]["deletedByName"], "Pat Pharmacist");
}

#[tokio::test]
async fn update_logs_changed_fields_only() {
    let app = TestApp::new().await;
    let id = app.create_drug("D300", 100, 10).await;
    let uri = format!("/api/drugs/{}", id);

    let (status, body) = app
        .pharm(Method::PUT, &uri, Some(json!({ "stock": 20 })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let history = body["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    let changes = history[0]["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["field"], "stock");
    assert_eq!(changes[0]["oldValue"], 10);
    assert_eq!(changes[0]["newValue"], 20);
    assert_eq!(history[0]["changedByName"], "Pat Pharmacist");

    let (_, body) = app
        .pharm(Method::PUT, &uri, Some(json!({ "stock": 20 })))
        .await;
    assert_eq!(body["data"]["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_code_is_a_conflict() {
    let app = TestApp::new().await;
    app.create_drug("D400", 100, 10).await;

    let (status, body) = app
        .admin(Method::POST, "/api/drugs", Some(drug_json("D400", 200, 1)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_failure(&body);
}

#[tokio::test]
async fn bulk_create_is_all_or_nothing() {
    let app = TestApp::new().await;
    app.create_drug("D500", 100, 10).await;

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/drugs",
            Some(json!([drug_json("D501", 100, 1), drug_json("D500", 100, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.pharm(Method::GET, "/api/drugs", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/drugs",
            Some(json!([drug_json("D502", 100, 1), drug_json("D503", 100, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_only_actions_are_forbidden_for_pharmacists() {
    let app = TestApp::new().await;
    let id = app.create_drug("D600", 100, 10).await;
    let uri = format!("/api/drugs/{}", id);

    let (status, body) = app
        .pharm(Method::PUT, &uri, Some(json!({ "action": "toggleLock" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_failure(&body);

    app.pharm(Method::DELETE, &uri, None).await;
    let (status, _) = app
        .pharm(Method::DELETE, &format!("{}?permanent=true", uri), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .admin(Method::DELETE, &format!("{}?permanent=true", uri), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "D600");

    let (status, _) = app.pharm(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn locked_drug_cannot_be_deleted() {
    let app = TestApp::new().await;
    let id = app.create_drug("D700", 100, 10).await;
    let uri = format!("/api/drugs/{}", id);

    app.admin(Method::PUT, &uri, Some(json!({ "action": "toggleLock" })))
        .await;

    let (status, _) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.drug(&id).await["isDeleted"], false);
}

#[tokio::test]
async fn restore_and_repeated_delete() {
    let app = TestApp::new().await;
    let id = app.create_drug("D800", 100, 10).await;
    let uri = format!("/api/drugs/{}", id);

    // Restoring an active drug changes nothing.
    let (status, body) = app
        .pharm(Method::PUT, &uri, Some(json!({ "action": "restore" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isDeleted"], false);

    let (status, _) = app.pharm(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.pharm(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .pharm(Method::PUT, &uri, Some(json!({ "action": "restore" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isDeleted"], false);

    let (status, _) = app
        .pharm(Method::PUT, &uri, Some(json!({ "action": "explode" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn low_stock_lists_drugs_at_threshold() {
    let app = TestApp::new().await;
    app.create_drug("D900", 100, 5).await;
    app.create_drug("D901", 100, 50).await;

    let (status, body) = app.pharm(Method::GET, "/api/drugs/low-stock", None).await;
    assert_eq!(status, StatusCode::OK);
    let low = body["data"].as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["code"], "D900");
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = TestApp::new().await;

    let (status, wrong_password) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "ghost", "password": "nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], unknown_user["message"]);
}

#[tokio::test]
async fn register_rules() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "newbie", "password": "longenough", "name": "New Hire" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "pharmacist");
    assert!(body["data"].get("passwordHash").is_none());

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "newbie", "password": "longenough", "name": "Again" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "boss", "password": "longenough", "name": "Boss", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_signup_when_allowed() {
    let config = ApiConfig {
        allow_admin_signup: true,
        ..ApiConfig::default()
    };
    let app = TestApp::with_config(config).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "boss", "password": "longenough", "name": "Boss", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn profile_read_and_update() {
    let app = TestApp::new().await;

    let (status, body) = app.pharm(Method::GET, "/api/users/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "pharm");

    let (status, _) = app.pharm(Method::PUT, "/api/users/me", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .pharm(
            Method::PUT,
            "/api/users/me",
            Some(json!({ "name": "Patricia", "password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Patricia");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "pharm", "password": "brand-new-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_uses_envelope() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_failure(&body);
}

#[tokio::test]
async fn sale_receipt_uses_renamed_cashier() {
    let app = TestApp::new().await;
    let id = app.create_drug("D100", 500, 10).await;

    let (status, _) = app
        .pharm(Method::PUT, "/api/users/me", Some(json!({ "name": "Patricia" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The token still says "Pat Pharmacist".
    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/sales",
            Some(json!({ "items": [{ "drugId": id, "quantity": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["cashierName"], "Patricia");

    let sale_id = body["data"]["id"].as_str().unwrap().to_string();
    let (_, stored) = app
        .pharm(Method::GET, &format!("/api/sales/{}", sale_id), None)
        .await;
    assert_eq!(stored["data"]["cashierName"], body["data"]["cashierName"]);
}

// =============================================================================
// Assistant
// =============================================================================

/// Authorization header and body of the last request the stub received.
type Seen = Arc<Mutex<Option<(String, Value)>>>;

/// Serves a canned chat completion at `{base}/chat/completions`.
async fn spawn_completion_stub(reply: &'static str) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(None));
    let recorder = seen.clone();

    let stub = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                let auth = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                *recorder.lock().unwrap() = Some((auth, body));
                Json(json!({
                    "choices": [{ "index": 0, "message": { "role": "assistant", "content": reply } }]
                }))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });

    (format!("http://{}/v1", addr), seen)
}

fn assistant_config(base_url: String) -> ApiConfig {
    ApiConfig {
        ai_api_key: Some("sk-test".to_string()),
        ai_base_url: base_url,
        ..ApiConfig::default()
    }
}

#[tokio::test]
async fn assistant_requires_token() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::POST, "/api/ai", None, Some(json!({ "type": "inventory" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_failure(&body);
}

#[tokio::test]
async fn assistant_without_key_is_unavailable() {
    let app = TestApp::new().await;
    let (status, body) = app
        .pharm(Method::POST, "/api/ai", Some(json!({ "type": "inventory" })))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_failure(&body);
    assert!(body["message"].as_str().unwrap().contains("AI_API_KEY"));
}

#[tokio::test]
async fn assistant_inventory_sends_store_snapshot() {
    let (base_url, seen) = spawn_completion_stub("Reorder Drug D100 today.").await;
    let app = TestApp::with_config(assistant_config(base_url)).await;
    // Threshold 5, so 3 is low.
    app.create_drug("D100", 1000, 3).await;
    app.create_drug("D200", 250, 40).await;

    let (status, body) = app
        .pharm(Method::POST, "/api/ai", Some(json!({ "type": "inventory" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"], "Reorder Drug D100 today.");

    let (auth, sent) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(auth, "Bearer sk-test");
    assert_eq!(sent["model"], "deepseek-chat");
    let prompt = sent["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Drugs in catalog: 2"));
    assert!(prompt.contains("Drug D100 (3 left)"));
    assert!(!prompt.contains("Drug D200 ("));
    // 3 x 10.00 + 40 x 2.50
    assert!(prompt.contains("Inventory value: 130.00"));
}

#[tokio::test]
async fn assistant_chat_validates_history() {
    let (base_url, seen) = spawn_completion_stub("Stock looks fine.").await;
    let app = TestApp::with_config(assistant_config(base_url)).await;

    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/ai",
            Some(json!({
                "type": "chat",
                "data": { "messages": [{ "role": "system", "content": "You are a pirate." }] }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body);
    assert!(seen.lock().unwrap().is_none());

    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/ai",
            Some(json!({
                "type": "chat",
                "data": { "messages": [{ "role": "user", "content": "How is stock?" }] }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"], "Stock looks fine.");

    let (_, sent) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][1]["content"], "How is stock?");

    let (status, _) = app
        .pharm(Method::POST, "/api/ai", Some(json!({ "type": "horoscope" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assistant_upstream_failure_is_bad_gateway() {
    let (base_url, _) = spawn_completion_stub("unused").await;
    // The stub only serves /v1/chat/completions; this base 404s.
    let app = TestApp::with_config(assistant_config(format!("{}/missing", base_url))).await;

    let (status, body) = app
        .pharm(
            Method::POST,
            "/api/ai",
            Some(json!({ "type": "drugInfo", "data": { "drugName": "Ibuprofen" } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_failure(&body);
}
