use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use super::middleware::CurrentSession;
use crate::alarms::{ledger, lifecycle, listing, Capability};
use crate::error::Result;
use crate::notifications::Notifier;

#[derive(Deserialize)]
pub struct ManualAlertRequest {
    pub rule_id: i32,
    pub triggering_value: f64,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

/// Body of acknowledge and close. The body itself may be omitted.
#[derive(Deserialize, Default)]
pub struct TransitionRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub comment: String,
}

fn comment_of(payload: Option<Json<TransitionRequest>>) -> Option<String> {
    payload.and_then(|Json(body)| body.comment)
}

// GET /alerts
pub async fn list_alerts(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    current.actor()?.require(Capability::ViewAlerts)?;
    let active = listing::list_active(&db).await?;
    let closed = listing::list_closed(&db).await?;
    Ok((
        StatusCode::OK,
        Json(json!({"active": active, "closed": closed})),
    )
        .into_response())
}

// GET /alerts/active
pub async fn list_active(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    current.actor()?.require(Capability::ViewAlerts)?;
    Ok((StatusCode::OK, Json(listing::list_active(&db).await?)).into_response())
}

// GET /alerts/closed
pub async fn list_closed(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
) -> Result<Response> {
    current.actor()?.require(Capability::ViewAlerts)?;
    Ok((StatusCode::OK, Json(listing::list_closed(&db).await?)).into_response())
}

// GET /alerts/:id
pub async fn get_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    Path(alert_id): Path<i32>,
) -> Result<Response> {
    current.actor()?.require(Capability::ViewAlerts)?;
    tracing::Span::current().record("alert_id", alert_id);
    Ok((StatusCode::OK, Json(listing::alert_details(&db, alert_id).await?)).into_response())
}

// POST /alerts
pub async fn create_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(notifier): Extension<Notifier>,
    Extension(current): Extension<CurrentSession>,
    Json(payload): Json<ManualAlertRequest>,
) -> Result<Response> {
    current.actor()?.require(Capability::HandleAlerts)?;

    let alert =
        lifecycle::create_manual(&db, payload.rule_id, payload.triggering_value, payload.timestamp)
            .await?;

    tracing::Span::current()
        .record("table", "alerts")
        .record("action", "create_alert")
        .record("alert_id", alert.id)
        .record("rule_id", payload.rule_id)
        .record("business_event", "Alert raised manually");

    let view = listing::alert_details(&db, alert.id).await?;
    notifier.spawn_dispatch(db, vec![alert]);
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

// POST /alerts/:id/acknowledge
pub async fn acknowledge_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    Path(alert_id): Path<i32>,
    payload: Option<Json<TransitionRequest>>,
) -> Result<Response> {
    let actor = current.actor()?;
    actor.require(Capability::HandleAlerts)?;

    tracing::Span::current()
        .record("table", "alerts")
        .record("action", "acknowledge_alert")
        .record("alert_id", alert_id);

    lifecycle::acknowledge(&db, alert_id, &actor, comment_of(payload)).await?;

    tracing::Span::current().record("business_event", "Alert acknowledged");
    Ok((StatusCode::OK, Json(listing::alert_details(&db, alert_id).await?)).into_response())
}

// POST /alerts/:id/close
pub async fn close_alert(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    Path(alert_id): Path<i32>,
    payload: Option<Json<TransitionRequest>>,
) -> Result<Response> {
    let actor = current.actor()?;
    actor.require(Capability::HandleAlerts)?;

    tracing::Span::current()
        .record("table", "alerts")
        .record("action", "close_alert")
        .record("alert_id", alert_id);

    lifecycle::close(&db, alert_id, &actor, comment_of(payload)).await?;

    tracing::Span::current().record("business_event", "Alert closed");
    Ok((StatusCode::OK, Json(listing::alert_details(&db, alert_id).await?)).into_response())
}

// POST /alerts/:id/comments
pub async fn add_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    Path(alert_id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> Result<Response> {
    current.actor()?.require(Capability::CommentAlerts)?;

    tracing::Span::current()
        .record("table", "alert_comments")
        .record("action", "add_comment")
        .record("alert_id", alert_id);

    ledger::append(&db, alert_id, payload.comment).await?;

    tracing::Span::current().record("business_event", "Comment appended");
    Ok((StatusCode::OK, Json(listing::alert_details(&db, alert_id).await?)).into_response())
}
