use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::alarms::types::{AlertPriority, AlertStatus};
use crate::entities::{alert_rule, alerts};

pub async fn init_metrics(db: &DatabaseConnection) {
    // Total Counts
    let rule_count = alert_rule::Entity::find().count(db).await.unwrap_or(0);
    ::metrics::gauge!("szebi_alert_rules_total").set(rule_count as f64);

    let active_count = alerts::Entity::find()
        .filter(alerts::Column::Status.ne(AlertStatus::Closed))
        .count(db)
        .await
        .unwrap_or(0);
    ::metrics::gauge!("szebi_alerts_active").set(active_count as f64);

    tracing::info!(
        "Initialized metrics: Rules={}, ActiveAlerts={}",
        rule_count,
        active_count
    );
}

pub fn rule_created() {
    ::metrics::counter!("szebi_alert_rules_created_total").increment(1);
    ::metrics::gauge!("szebi_alert_rules_total").increment(1.0);
}

pub fn rule_deleted() {
    ::metrics::counter!("szebi_alert_rules_deleted_total").increment(1);
    ::metrics::gauge!("szebi_alert_rules_total").decrement(1.0);
}

pub fn rule_misconfigured(rule_id: i32) {
    ::metrics::counter!("szebi_alert_rules_misconfigured_total", "rule_id" => rule_id.to_string())
        .increment(1);
}

pub fn alert_generated(priority: AlertPriority) {
    ::metrics::counter!("szebi_alerts_generated_total", "priority" => priority.as_str())
        .increment(1);
    ::metrics::gauge!("szebi_alerts_active").increment(1.0);
}

pub fn alert_acknowledged() {
    ::metrics::counter!("szebi_alerts_acknowledged_total").increment(1);
}

pub fn alert_closed() {
    ::metrics::counter!("szebi_alerts_closed_total").increment(1);
    ::metrics::gauge!("szebi_alerts_active").decrement(1.0);
}

pub fn increment_notifications_sent(channel: &str) {
    ::metrics::counter!("szebi_notifications_sent_total", "channel" => channel.to_string())
        .increment(1);
}

pub fn increment_notifications_failed(channel: &str) {
    ::metrics::counter!("szebi_notifications_failed_total", "channel" => channel.to_string())
        .increment(1);
}

pub fn record_acknowledgment_time(seconds: f64) {
    ::metrics::histogram!("szebi_alert_acknowledgment_duration_seconds").record(seconds);
}
