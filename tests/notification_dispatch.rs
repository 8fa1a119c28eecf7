mod common;

use common::{create_rule, create_user, high_usage_rule, setup_db};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use szebi_alarms::accounts::{self, NewUser};
use szebi_alarms::alarms::types::{NotificationChannel, NotificationStatus};
use szebi_alarms::alarms::{lifecycle, AlertPriority, Role};
use szebi_alarms::entities::{notification_log, user};
use szebi_alarms::notifications::{
    routing, EmailSender, EmergencyForwarder, NotificationTemplates, Notifier,
};

async fn seed_users(db: &sea_orm::DatabaseConnection) {
    create_user(db, "admin", Some(Role::BuildingAdmin)).await;
    create_user(db, "engineer", Some(Role::MaintenanceEngineer)).await;
    create_user(db, "worker", Some(Role::Worker)).await;
    create_user(db, "provider", Some(Role::EnergyProvider)).await;
    create_user(db, "guest", None).await;

    let retired = create_user(db, "retired", Some(Role::BuildingAdmin)).await;
    let mut retired: user::ActiveModel = retired.into();
    retired.is_active = Set(false);
    retired.update(db).await.unwrap();
}

async fn routed(db: &sea_orm::DatabaseConnection, priority: AlertPriority) -> Vec<String> {
    routing::recipients(db, priority)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect()
}

#[tokio::test]
async fn routing_follows_priority_matrix() {
    let db = setup_db().await;
    seed_users(&db).await;

    assert_eq!(
        routed(&db, AlertPriority::Critical).await,
        vec!["admin", "engineer", "worker", "provider"]
    );
    assert_eq!(routed(&db, AlertPriority::High).await, vec!["admin", "engineer"]);
    assert_eq!(
        routed(&db, AlertPriority::Medium).await,
        vec!["admin", "engineer", "provider"]
    );
    assert_eq!(routed(&db, AlertPriority::Low).await, vec!["admin"]);
}

#[tokio::test]
async fn dispatch_logs_one_row_per_recipient() {
    let db = setup_db().await;
    seed_users(&db).await;
    let rule = high_usage_rule(&db).await;
    let alert = lifecycle::generate(&db, &rule, 150.0, None).await.unwrap();

    let notifier = Notifier::mocked().unwrap();
    let summary = notifier.dispatch(&db, &alert).await.unwrap();
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.emergency_forwarded, None);

    let logs = notification_log::Entity::find()
        .filter(notification_log::Column::AlertId.eq(alert.id))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.status == NotificationStatus::Sent
        && l.channel == NotificationChannel::Email
        && l.error_message.is_empty()));
}

#[tokio::test]
async fn recipient_without_address_is_logged_as_failed() {
    let db = setup_db().await;
    let admin = accounts::create_user(
        &db,
        NewUser {
            username: "admin".into(),
            email: "   ".into(),
            password: common::PASSWORD.into(),
            role: Some(Role::BuildingAdmin),
        },
    )
    .await
    .unwrap();
    let rule = high_usage_rule(&db).await;
    let alert = lifecycle::generate(&db, &rule, 150.0, None).await.unwrap();

    let summary = Notifier::mocked().unwrap().dispatch(&db, &alert).await.unwrap();
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 1);

    let log = notification_log::Entity::find()
        .one(&db)
        .await
        .unwrap()
        .expect("failure should be logged");
    assert_eq!(log.recipient_id, admin.id);
    assert_eq!(log.status, NotificationStatus::Failed);
    assert!(!log.error_message.is_empty());
}

#[tokio::test]
async fn critical_alert_is_forwarded_even_when_logging_fails() {
    let db = setup_db().await;
    seed_users(&db).await;
    let rule = create_rule(&db, "Grid overload", "grid_power", "GREATER_THAN", None, Some(500.0), 0, "CRITICAL").await;
    let alert = lifecycle::generate(&db, &rule, 750.0, None).await.unwrap();

    // Nothing listens on the discard port; the forward fails fast.
    let notifier = Notifier::new(
        NotificationTemplates::new().unwrap(),
        EmailSender::mocked("alarms@example.com"),
        Some(EmergencyForwarder::new("http://127.0.0.1:9/emergency".into()).unwrap()),
    );

    db.execute_unprepared("ALTER TABLE notification_logs RENAME TO notification_logs_parked")
        .await
        .unwrap();
    let summary = notifier.dispatch(&db, &alert).await.unwrap();

    assert_eq!(summary.emergency_forwarded, Some(false));
    assert_eq!(summary.sent, 4);
    assert_eq!(summary.unlogged, 4);
}
