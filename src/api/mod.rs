//! HTTP surface. Handlers check capabilities and delegate to `alarms`.

pub mod alerts;
pub mod auth;
pub mod middleware;
pub mod rules;
pub mod samples;
pub mod users;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;

use crate::alarms::SharedTracker;
use crate::config::{AppConfig, ConfigError};
use crate::notifications::Notifier;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl: chrono::Duration,
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn app(
    db: DatabaseConnection,
    notifier: Notifier,
    tracker: SharedTracker,
    config: &AppConfig,
) -> Result<Router, ConfigError> {
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| ConfigError::Invalid {
            key: "CORS_ALLOWED_ORIGIN",
            value: config.cors_origin.clone(),
        })?;

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users", post(users::create_user))
        .route("/users/me", get(auth::me))
        .route("/rules", get(rules::list_rules).post(rules::create_rule))
        .route("/rules/:id", delete(rules::delete_rule))
        .route("/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/alerts/active", get(alerts::list_active))
        .route("/alerts/closed", get(alerts::list_closed))
        .route("/alerts/:id", get(alerts::get_alert))
        .route("/alerts/:id/acknowledge", post(alerts::acknowledge_alert))
        .route("/alerts/:id/close", post(alerts::close_alert))
        .route("/alerts/:id/comments", post(alerts::add_comment))
        .route("/samples", post(samples::ingest_sample))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(notifier))
        .layer(Extension(tracker))
        .layer(Extension(SessionSettings {
            ttl: config.session_ttl,
        }))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /path", e.g. "POST /alerts/:id/close"
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    let user_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Handlers fill in the business fields.
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        user_ip = user_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        alert_id = tracing::field::Empty,
                        rule_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(middleware::CSRF_HEADER),
                ])
                .allow_credentials(true),
        ))
}
