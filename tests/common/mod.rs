#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use bookstore_api::{
    app_router,
    auth::{Role, TokenSubject},
    config::AppConfig,
    db,
    events::{self, EventSender},
    services::{
        accounts::SignupInput,
        notifications::LogNotifier,
        staff::AdminInput,
    },
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const VERIFY_KEY: &str = "test-verify-key";

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin_token: String,
    pub user_token: String,
    pub user_id: i32,
    _uploads: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().expect("temp upload dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.verification_keys = Some(VERIFY_KEY.to_string());
        cfg.upload_dir = uploads.path().to_string_lossy().into_owned();
        cfg.public_base_url = Some("http://books.test".to_string());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx, Arc::new(LogNotifier)));

        let state = AppState::new(pool, cfg, EventSender::new(event_tx));
        let router = app_router(state.clone());

        let admin = state
            .services
            .staff
            .create_admin(
                None,
                AdminInput {
                    name: "Head Librarian".to_string(),
                    phone: "9000000001".to_string(),
                },
            )
            .await
            .expect("seed admin");
        let admin_token = state
            .auth
            .issue_access_token(&TokenSubject {
                id: admin.id,
                name: admin.name.clone(),
                phone: admin.phone.clone(),
                email: None,
                role: Role::Admin,
            })
            .expect("admin token");

        let session = state
            .services
            .accounts
            .signup(SignupInput {
                name: "Reader One".to_string(),
                phone: "9000000100".to_string(),
                email: "reader@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .expect("seed reader");

        Self {
            router,
            state,
            admin_token,
            user_token: session.token,
            user_id: session.user.id,
            _uploads: uploads,
            _event_task: event_task,
        }
    }

    /// Send a request carrying the verify key and an optional `A-Verify` token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("verifyme", VERIFY_KEY);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("A-Verify {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Send a fully built request.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn as_admin(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(&self.admin_token)).await
    }

    pub async fn as_user(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(&self.user_token)).await
    }

    /// Registers another reader and returns their token and id.
    pub async fn signup(&self, name: &str, phone: &str, email: &str) -> (String, i32) {
        let response = self
            .request(
                Method::POST,
                "/signup",
                Some(json!({
                    "name": name,
                    "phone": phone,
                    "email": email,
                    "password": "secret123"
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        (
            body["token"].as_str().expect("token").to_string(),
            body["user"]["id"].as_i64().expect("user id") as i32,
        )
    }

    pub async fn create_author(&self, name: &str, percent: &str) -> i64 {
        let response = self
            .as_admin(
                Method::POST,
                "/author",
                Some(json!({ "name": name, "percent": percent })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["author"]["id"]
            .as_i64()
            .expect("author id")
    }

    pub async fn create_book(&self, name: &str, author_id: i64, price: &str) -> i64 {
        self.create_book_with(json!({
            "name": name,
            "authorId": author_id,
            "description": format!("{} description", name),
            "price": price,
            "image": ["http://books.test/uploads/cover.png"],
            "pdf": ["http://books.test/uploads/full.pdf"]
        }))
        .await
    }

    pub async fn create_book_with(&self, payload: Value) -> i64 {
        let response = self.as_admin(Method::POST, "/book", Some(payload)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["book"]["id"]
            .as_i64()
            .expect("book id")
    }

    pub async fn create_plan(&self, title: &str, price: &str, duration_days: i32) -> i64 {
        let response = self
            .as_admin(
                Method::POST,
                "/plan",
                Some(json!({
                    "image": "http://books.test/uploads/plan.png",
                    "title": title,
                    "benefits": ["Unlimited premium reading"],
                    "duration": format!("{} days", duration_days),
                    "durationDays": duration_days,
                    "price": price
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await["plan"]["id"]
            .as_i64()
            .expect("plan id")
    }

    pub async fn create_coupon(&self, code: &str, kind: &str, value: &str, qty: i32) {
        let response = self
            .as_admin(
                Method::POST,
                "/coupon",
                Some(json!({ "coupon": code, "type": kind, "value": value, "qty": qty })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    pub async fn add_to_cart(&self, token: &str, book_id: i64) -> Response {
        self.request(
            Method::POST,
            "/cart",
            Some(json!({ "bookId": book_id })),
            Some(token),
        )
        .await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a money value that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}
