mod common;

use axum::http::StatusCode;
use common::{build_test_app, call, create_user, login, request_json, TestApp};
use serde_json::json;
use szebi_alarms::alarms::Role;

async fn app_with_staff() -> TestApp {
    let test = build_test_app().await;
    create_user(&test.db, "admin", Some(Role::BuildingAdmin)).await;
    create_user(&test.db, "engineer", Some(Role::MaintenanceEngineer)).await;
    create_user(&test.db, "worker", Some(Role::Worker)).await;
    test
}

fn high_usage() -> serde_json::Value {
    json!({
        "name": "High usage",
        "target_metric": "power",
        "operator": "GREATER_THAN",
        "threshold_max": 100.0,
        "duration_seconds": 0,
        "priority": "HIGH"
    })
}

#[tokio::test]
async fn health_is_public() {
    let test = build_test_app().await;
    let (status, body) = request_json(&test.app, "GET", "/health", None, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn requests_without_session_are_unauthorized() {
    let test = build_test_app().await;

    let (status, body) =
        request_json(&test.app, "POST", "/rules", None, None, Some(high_usage())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");

    let (status, _) = request_json(
        &test.app,
        "GET",
        "/alerts",
        Some("szebi_session=not-a-uuid"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let test = app_with_staff().await;
    let (status, _) = request_json(
        &test.app,
        "POST",
        "/auth/login",
        None,
        None,
        Some(json!({"username": "admin", "password": "nope-nope-nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mutations_need_csrf_token() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;

    let (status, _) = request_json(
        &test.app,
        "POST",
        "/rules",
        Some(&admin.cookie),
        None,
        Some(high_usage()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request_json(
        &test.app,
        "POST",
        "/rules",
        Some(&admin.cookie),
        Some("00000000-0000-0000-0000-000000000000"),
        Some(high_usage()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rule) = call(&test.app, &admin, "POST", "/rules", Some(high_usage())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rule["operator"], "GREATER_THAN");
    assert_eq!(rule["priority"], "HIGH");

    // Reads do not need the header.
    let (status, rules) =
        request_json(&test.app, "GET", "/rules", Some(&admin.cookie), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rules.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_rule_is_bad_request() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;

    let mut rule = high_usage();
    rule["operator"] = json!("BETWEEN");
    let (status, body) = call(&test.app, &admin, "POST", "/rules", Some(rule)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("BETWEEN"));
}

#[tokio::test]
async fn alert_flow_from_sample_to_closed() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;
    let engineer = login(&test.app, "engineer").await;

    call(&test.app, &admin, "POST", "/rules", Some(high_usage())).await;

    let (status, body) = call(
        &test.app,
        &admin,
        "POST",
        "/samples",
        Some(json!({"metric": "power", "value": 150.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let generated = body["generated"].as_array().unwrap();
    assert_eq!(generated.len(), 1);
    let id = generated[0]["id"].as_i64().unwrap();

    let (status, active) = call(&test.app, &engineer, "GET", "/alerts/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active[0]["status"], "NEW");
    assert_eq!(active[0]["alert_rule"]["name"], "High usage");

    let (status, acked) = call(
        &test.app,
        &engineer,
        "POST",
        &format!("/alerts/{id}/acknowledge"),
        Some(json!({"comment": "on my way"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["status"], "ACKNOWLEDGED");
    assert_eq!(acked["acknowledged_by"]["username"], "engineer");
    assert_eq!(acked["alert_comment"]["text"], "on my way");

    let (status, body) = call(
        &test.app,
        &engineer,
        "POST",
        &format!("/alerts/{id}/acknowledge"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("ACKNOWLEDGED"));

    let (status, _) = call(
        &test.app,
        &engineer,
        "POST",
        &format!("/alerts/{id}/comments"),
        Some(json!({"comment": "breaker reset"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, closed) = call(
        &test.app,
        &engineer,
        "POST",
        &format!("/alerts/{id}/close"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "CLOSED");
    assert_eq!(
        closed["alert_comment"]["text"],
        "on my way\n\n---\n\nbreaker reset"
    );

    let (status, all) = call(&test.app, &engineer, "GET", "/alerts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["active"].as_array().map(Vec::len), Some(0));
    assert_eq!(all["closed"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn workers_can_read_but_not_handle_alerts() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;
    let worker = login(&test.app, "worker").await;

    let (_, rule) = call(&test.app, &admin, "POST", "/rules", Some(high_usage())).await;
    let (status, alert) = call(
        &test.app,
        &admin,
        "POST",
        "/alerts",
        Some(json!({"rule_id": rule["id"], "triggering_value": 120.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = alert["id"].as_i64().unwrap();

    let (status, _) = call(&test.app, &worker, "GET", &format!("/alerts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &test.app,
        &worker,
        "POST",
        &format!("/alerts/{id}/acknowledge"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&test.app, &worker, "POST", "/rules", Some(high_usage())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, detail) = call(&test.app, &worker, "GET", &format!("/alerts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "NEW");
}

#[tokio::test]
async fn unknown_alert_is_not_found() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;

    let (status, _) = call(&test.app, &admin, "GET", "/alerts/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&test.app, &admin, "DELETE", "/rules/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_create_users() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;
    let engineer = login(&test.app, "engineer").await;

    let new_user = json!({
        "username": "provider",
        "email": "provider@example.com",
        "password": "long-enough-secret",
        "role": "energy_provider"
    });

    let (status, _) = call(&test.app, &engineer, "POST", "/users", Some(new_user.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = call(&test.app, &admin, "POST", "/users", Some(new_user)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "energy_provider");
    assert!(created.get("password_hash").is_none());
}

#[tokio::test]
async fn logout_ends_session() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;

    let (status, me) = call(&test.app, &admin, "GET", "/users/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");

    let (status, _) = call(&test.app, &admin, "POST", "/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&test.app, &admin, "GET", "/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transitions_accept_requests_without_body() {
    let test = app_with_staff().await;
    let admin = login(&test.app, "admin").await;
    let engineer = login(&test.app, "engineer").await;

    let (_, rule) = call(&test.app, &admin, "POST", "/rules", Some(high_usage())).await;
    let (_, alert) = call(
        &test.app,
        &admin,
        "POST",
        "/alerts",
        Some(json!({"rule_id": rule["id"], "triggering_value": 130.0})),
    )
    .await;
    let id = alert["id"].as_i64().unwrap();

    let (status, acked) = call(
        &test.app,
        &engineer,
        "POST",
        &format!("/alerts/{id}/acknowledge"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(acked["status"], "ACKNOWLEDGED");
    assert!(acked["alert_comment"].is_null());

    let (status, closed) =
        call(&test.app, &engineer, "POST", &format!("/alerts/{id}/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "CLOSED");
    assert!(closed["alert_comment"].is_null());
}
