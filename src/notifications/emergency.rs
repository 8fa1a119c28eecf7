use std::time::Duration;
use tracing::{error, info};

use crate::entities::alerts;

/// Forwards CRITICAL alerts to the optimization module's emergency endpoint
/// as a GET with the alert in the query string.
#[derive(Clone)]
pub struct EmergencyForwarder {
    client: reqwest::Client,
    endpoint: String,
}

impl EmergencyForwarder {
    pub fn new(endpoint: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Returns whether the endpoint answered with a success status. Never retried.
    pub async fn forward(&self, alert: &alerts::Model) -> bool {
        let params = query_params(alert);
        match self.client.get(&self.endpoint).query(&params).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(alert_id = alert.id, "Alert forwarded to {}", self.endpoint);
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!(
                    alert_id = alert.id,
                    "Emergency endpoint {} answered {} - {}", self.endpoint, status, body
                );
                false
            }
            Err(e) => {
                error!(alert_id = alert.id, "Could not reach {}: {}", self.endpoint, e);
                false
            }
        }
    }
}

pub(crate) fn query_params(alert: &alerts::Model) -> Vec<(&'static str, String)> {
    vec![
        ("id", alert.id.to_string()),
        ("status", alert.status.to_string()),
        ("priority", alert.priority.to_string()),
        ("triggering_value", alert.triggering_value.to_string()),
        (
            "timestamp_generated",
            alert
                .timestamp_generated
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        ("rule_name", alert.rule_name.clone()),
        ("rule_metric", alert.target_metric.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::types::{AlertPriority, AlertStatus};

    #[test]
    fn query_carries_alert_identity() {
        let alert = alerts::Model {
            id: 5,
            rule_id: None,
            rule_name: "Grid overload".into(),
            target_metric: "grid_power".into(),
            triggering_value: 250.0,
            timestamp_generated: chrono::NaiveDate::from_ymd_opt(2026, 5, 6)
                .unwrap()
                .and_hms_opt(7, 8, 9)
                .unwrap(),
            timestamp_acknowledged: None,
            timestamp_closed: None,
            status: AlertStatus::New,
            priority: AlertPriority::Critical,
            acknowledged_by: None,
            closed_by: None,
        };

        let params = query_params(&alert);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("id"), Some("5"));
        assert_eq!(get("priority"), Some("CRITICAL"));
        assert_eq!(get("status"), Some("NEW"));
        assert_eq!(get("triggering_value"), Some("250"));
        assert_eq!(get("timestamp_generated"), Some("2026-05-06T07:08:09"));
        assert_eq!(get("rule_metric"), Some("grid_power"));
    }
}
