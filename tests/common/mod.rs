#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use szebi_alarms::accounts::{self, NewUser};
use szebi_alarms::alarms::rules::{self, NewRule};
use szebi_alarms::alarms::{Actor, Role, SharedTracker, ViolationTracker};
use szebi_alarms::config::AppConfig;
use szebi_alarms::entities::{alert_rule, user};
use szebi_alarms::migrator::Migrator;
use szebi_alarms::notifications::Notifier;
use tower::util::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

/// Fresh in-memory database with all migrations applied. One pooled
/// connection, since every SQLite memory connection is its own database.
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("in-memory sqlite should open");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str, role: Option<Role>) -> user::Model {
    accounts::create_user(
        db,
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: PASSWORD.to_string(),
            role,
        },
    )
    .await
    .expect("user should be created")
}

pub fn actor(account: &user::Model) -> Actor {
    accounts::actor_for(account).expect("user should have a role")
}

pub async fn create_rule(
    db: &DatabaseConnection,
    name: &str,
    metric: &str,
    operator: &str,
    threshold_min: Option<f64>,
    threshold_max: Option<f64>,
    duration_seconds: i64,
    priority: &str,
) -> alert_rule::Model {
    rules::create(
        db,
        NewRule {
            name: name.to_string(),
            target_metric: metric.to_string(),
            operator: operator.to_string(),
            threshold_min,
            threshold_max,
            duration_seconds,
            priority: Some(priority.to_string()),
        },
    )
    .await
    .expect("rule should be created")
}

/// "High usage": power GREATER_THAN 100, immediate, HIGH.
pub async fn high_usage_rule(db: &DatabaseConnection) -> alert_rule::Model {
    create_rule(db, "High usage", "power", "GREATER_THAN", None, Some(100.0), 0, "HIGH").await
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        _ => None,
    })
    .expect("test config should load")
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub tracker: SharedTracker,
    pub app: axum::Router,
}

pub async fn build_test_app() -> TestApp {
    let db = setup_db().await;
    let tracker = ViolationTracker::shared();
    let notifier = Notifier::mocked().expect("templates should compile");
    let app = szebi_alarms::api::app(db.clone(), notifier, tracker.clone(), &test_config())
        .expect("router should build");
    TestApp { db, tracker, app }
}

/// Cookie header value and CSRF token of a signed-in user.
pub struct Credentials {
    pub cookie: String,
    pub csrf: String,
}

pub async fn login(app: &axum::Router, username: &str) -> Credentials {
    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({"username": username, "password": PASSWORD}).to_string(),
        ))
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("szebi_session="))
        .and_then(|v| v.split(';').next())
        .expect("session cookie should be set")
        .to_string();

    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let body: Value = serde_json::from_slice(&bytes).expect("login body should be json");
    let csrf = body["csrf_token"]
        .as_str()
        .expect("csrf token should exist")
        .to_string();

    Credentials { cookie, csrf }
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    csrf: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(csrf) = csrf {
        builder = builder.header("X-CSRF-Token", csrf);
    }

    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json)
}

/// Authenticated request carrying the CSRF header.
pub async fn call(
    app: &axum::Router,
    creds: &Credentials,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    request_json(app, method, uri, Some(&creds.cookie), Some(&creds.csrf), body).await
}
