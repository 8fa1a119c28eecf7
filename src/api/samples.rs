use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use super::middleware::CurrentSession;
use crate::alarms::monitoring::{self, Sample};
use crate::alarms::{Capability, SharedTracker};
use crate::error::Result;
use crate::notifications::Notifier;

// POST /samples
pub async fn ingest_sample(
    Extension(db): Extension<DatabaseConnection>,
    Extension(tracker): Extension<SharedTracker>,
    Extension(notifier): Extension<Notifier>,
    Extension(current): Extension<CurrentSession>,
    Json(sample): Json<Sample>,
) -> Result<Response> {
    current.actor()?.require(Capability::IngestSamples)?;

    let generated = monitoring::inspect(&db, &tracker, sample).await?;

    tracing::Span::current()
        .record("table", "alerts")
        .record("action", "ingest_sample");
    if !generated.is_empty() {
        tracing::Span::current().record(
            "business_event",
            tracing::field::display(format!("{} alert(s) generated", generated.len())),
        );
    }

    let response = Json(json!({"generated": generated}));
    notifier.spawn_dispatch(db, generated);
    Ok((StatusCode::OK, response).into_response())
}
