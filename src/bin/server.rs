use axum::routing::get;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use szebi_alarms::{
    accounts, api,
    alarms::ViolationTracker,
    config::AppConfig,
    migrator,
    notifications::{EmailSender, EmergencyForwarder, NotificationTemplates, Notifier},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    szebi_alarms::telemetry::init_telemetry("szebi-alarms")?;

    let config = AppConfig::from_env()?;

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url).await?;
    migrator::Migrator::up(&db, None).await?;

    if let Some(admin) = &config.bootstrap_admin {
        accounts::ensure_bootstrap_admin(&db, admin).await?;
    }

    szebi_alarms::metrics::init_metrics(&db).await;

    let emergency = match &config.emergency_endpoint {
        Some(url) => Some(EmergencyForwarder::new(url.clone())?),
        None => {
            tracing::warn!("EMERGENCY_ENDPOINT_URL not set. CRITICAL alerts will not be forwarded.");
            None
        }
    };
    let notifier = Notifier::new(
        NotificationTemplates::new()?,
        EmailSender::new(config.sendgrid_api_key.clone(), config.email_from.clone()),
        emergency,
    );

    let app = api::app(db, notifier, ViolationTracker::shared(), &config)?
        .layer(prometheus_layer)
        .route("/metrics", get(|| async move { metric_handle.render() }));

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
