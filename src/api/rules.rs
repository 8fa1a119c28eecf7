use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;

use super::middleware::CurrentSession;
use crate::alarms::{listing, rules, rules::NewRule, Capability, SharedTracker};
use crate::error::Result;

// GET /rules
pub async fn list_rules(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    current.actor()?.require(Capability::ViewAlerts)?;
    let rules = listing::list_rules(&db).await?;
    Ok((StatusCode::OK, Json(rules)).into_response())
}

// POST /rules
pub async fn create_rule(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    Json(payload): Json<NewRule>,
) -> Result<Response> {
    current.actor()?.require(Capability::ManageRules)?;

    let rule = rules::create(&db, payload).await?;

    tracing::Span::current()
        .record("table", "alert_rules")
        .record("action", "create_rule")
        .record("rule_id", rule.id)
        .record("business_event", "Alert rule created");

    Ok((StatusCode::CREATED, Json(rule)).into_response())
}

// DELETE /rules/:id
pub async fn delete_rule(
    Extension(db): Extension<DatabaseConnection>,
    Extension(tracker): Extension<SharedTracker>,
    Extension(current): Extension<CurrentSession>,
    Path(rule_id): Path<i32>,
) -> Result<Response> {
    current.actor()?.require(Capability::ManageRules)?;

    tracing::Span::current()
        .record("table", "alert_rules")
        .record("action", "delete_rule")
        .record("rule_id", rule_id);

    rules::delete(&db, rule_id).await?;
    tracker.lock().await.forget(rule_id);

    tracing::Span::current().record("business_event", "Alert rule deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
