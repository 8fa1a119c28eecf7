use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

use super::middleware::{CurrentSession, SESSION_COOKIE};
use super::SessionSettings;
use crate::accounts;
use crate::error::Result;

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(settings): Extension<SessionSettings>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let user = match accounts::authenticate(&db, &payload.username, &payload.password).await {
        Ok(user) => user,
        Err(e) => {
            tracing::Span::current()
                .record("table", "users")
                .record("action", "login_user_failed");
            return Err(e);
        }
    };
    let session = accounts::open_session(&db, &user, settings.ttl).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookies.add(cookie);

    tracing::Span::current()
        .record("table", "sessions")
        .record("action", "login_user")
        .record("user_id", user.id)
        .record("business_event", "User logged in successfully");

    Ok((
        StatusCode::OK,
        Json(json!({"user": user, "csrf_token": session.csrf_token})),
    )
        .into_response())
}

pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    Extension(current): Extension<CurrentSession>,
    cookies: Cookies,
) -> Result<Response> {
    accounts::close_session(&db, current.token).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookies.remove(cookie);

    tracing::Span::current()
        .record("table", "sessions")
        .record("action", "logout_user")
        .record("business_event", "User logged out");

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn me(Extension(current): Extension<CurrentSession>) -> Response {
    (StatusCode::OK, Json(current.user)).into_response()
}
