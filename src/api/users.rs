use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;

use super::middleware::CurrentSession;
use crate::accounts::{self, NewUser};
use crate::alarms::Capability;
use crate::error::Result;

// POST /users
pub async fn create_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    Json(payload): Json<NewUser>,
) -> Result<Response> {
    current.actor()?.require(Capability::ManageUsers)?;

    let user = accounts::create_user(&db, payload).await?;

    tracing::Span::current()
        .record("table", "users")
        .record("action", "create_user")
        .record("business_event", "User created");

    Ok((StatusCode::CREATED, Json(user)).into_response())
}
