use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;

use crate::entities::alerts;
use crate::error::{AlarmError, Result};

const ALERT_EMAIL: &str = "alert_email";

const ALERT_EMAIL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 8px; }
        .badge { background-color: {{badge_color}}; color: white; padding: 5px 10px; border-radius: 4px; font-weight: bold; display: inline-block; }
        table { border-collapse: collapse; margin-top: 15px; }
        td { padding: 4px 12px 4px 0; }
        .footer { margin-top: 30px; font-size: 12px; color: #b2bec3; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <h1>New alarm: {{rule_name}}</h1>
        <div class="badge">PRIORITY: {{priority}}</div>
        <table>
            <tr><td><strong>Metric</strong></td><td>{{target_metric}}</td></tr>
            <tr><td><strong>Triggering value</strong></td><td>{{triggering_value}}</td></tr>
            <tr><td><strong>Status</strong></td><td>{{status}}</td></tr>
            <tr><td><strong>Generated at</strong></td><td>{{generated_at}}</td></tr>
        </table>
        <p>Sign in to the dashboard to acknowledge or close this alarm.</p>
        <div class="footer">
            <p>Sent by the SZEBI alarm service (alert #{{alert_id}})</p>
        </div>
    </div>
</body>
</html>
"#;

#[derive(Serialize)]
struct AlertEmailContext<'a> {
    alert_id: i32,
    rule_name: &'a str,
    target_metric: &'a str,
    triggering_value: f64,
    priority: &'static str,
    status: &'static str,
    generated_at: String,
    badge_color: &'static str,
}

/// Compiled email templates. Cheap to clone.
#[derive(Clone)]
pub struct NotificationTemplates {
    registry: Arc<Handlebars<'static>>,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(ALERT_EMAIL, ALERT_EMAIL_TEMPLATE)
            .map_err(|e| AlarmError::Internal(format!("invalid email template: {e}")))?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn alert_subject(alert: &alerts::Model) -> String {
        format!("[{}] New alarm: {}", alert.priority, alert.rule_name)
    }

    pub fn alert_email(&self, alert: &alerts::Model) -> Result<String> {
        let ctx = AlertEmailContext {
            alert_id: alert.id,
            rule_name: &alert.rule_name,
            target_metric: &alert.target_metric,
            triggering_value: alert.triggering_value,
            priority: alert.priority.as_str(),
            status: alert.status.as_str(),
            generated_at: alert
                .timestamp_generated
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            badge_color: badge_color(alert),
        };
        self.registry
            .render(ALERT_EMAIL, &ctx)
            .map_err(|e| AlarmError::Internal(format!("failed to render alert email: {e}")))
    }
}

fn badge_color(alert: &alerts::Model) -> &'static str {
    use crate::alarms::types::AlertPriority::*;
    match alert.priority {
        Critical => "#d63031",
        High => "#e17055",
        Medium => "#fdcb6e",
        Low => "#0984e3",
    }
}
