use axum::{
    extract::{Extension, Request},
    http::Method,
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::accounts;
use crate::alarms::access::Actor;
use crate::entities::user;
use crate::error::{AlarmError, Result};

pub const SESSION_COOKIE: &str = "szebi_session";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// The signed-in user, inserted for every authenticated route.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: Uuid,
    pub user: user::Model,
}

impl CurrentSession {
    pub fn actor(&self) -> Result<Actor> {
        accounts::actor_for(&self.user)
    }
}

pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .ok_or(AlarmError::Unauthorized)?;

    let (session, user) = accounts::resolve_session(&db, token).await?;

    if !is_safe(request.method()) {
        let presented = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok());
        if presented != Some(session.csrf_token) {
            return Err(AlarmError::Forbidden(
                "missing or invalid CSRF token".to_string(),
            ));
        }
    }

    tracing::Span::current().record("user_id", user.id);
    request
        .extensions_mut()
        .insert(CurrentSession { token, user });
    Ok(next.run(request).await)
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}
