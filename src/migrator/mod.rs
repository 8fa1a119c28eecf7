use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users_and_sessions;
mod m20261001_000002_create_alert_rules;
mod m20261001_000003_create_alerts;
mod m20261001_000004_create_alert_comments;
mod m20261001_000005_create_notification_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users_and_sessions::Migration),
            Box::new(m20261001_000002_create_alert_rules::Migration),
            Box::new(m20261001_000003_create_alerts::Migration),
            Box::new(m20261001_000004_create_alert_comments::Migration),
            Box::new(m20261001_000005_create_notification_logs::Migration),
        ]
    }
}
