//! Fan-out of freshly generated alerts to users and the emergency endpoint.

pub mod email;
pub mod emergency;
pub mod routing;
pub mod templates;

pub use email::EmailSender;
pub use emergency::EmergencyForwarder;
pub use templates::NotificationTemplates;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Serialize;
use tracing::{error, info, Instrument};

use crate::alarms::types::{AlertPriority, NotificationChannel, NotificationStatus};
use crate::entities::{alerts, notification_log};
use crate::error::Result;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    /// Attempts whose log row could not be written.
    pub unlogged: usize,
    /// `None` when the alert was not forwarded at all.
    pub emergency_forwarded: Option<bool>,
}

#[derive(Clone)]
pub struct Notifier {
    templates: NotificationTemplates,
    email: EmailSender,
    emergency: Option<EmergencyForwarder>,
}

impl Notifier {
    pub fn new(
        templates: NotificationTemplates,
        email: EmailSender,
        emergency: Option<EmergencyForwarder>,
    ) -> Self {
        Self {
            templates,
            email,
            emergency,
        }
    }

    /// Mock email, no emergency endpoint.
    pub fn mocked() -> Result<Self> {
        Ok(Self::new(
            NotificationTemplates::new()?,
            EmailSender::mocked("alarms@szebi.local"),
            None,
        ))
    }

    /// Forwards CRITICAL alerts to the emergency endpoint, then emails every
    /// routed recipient and records one log row per attempt. Delivery and
    /// log-row failures are logged, never returned.
    pub async fn dispatch(
        &self,
        db: &DatabaseConnection,
        alert: &alerts::Model,
    ) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();

        if alert.priority == AlertPriority::Critical {
            if let Some(forwarder) = &self.emergency {
                summary.emergency_forwarded = Some(forwarder.forward(alert).await);
            }
        }

        let subject = NotificationTemplates::alert_subject(alert);
        let body = self.templates.alert_email(alert)?;

        for recipient in routing::recipients(db, alert.priority).await? {
            let outcome = self
                .email
                .send_email(&recipient.email, &recipient.username, &subject, &body)
                .await;

            let (status, error_message) = match outcome {
                Ok(()) => {
                    summary.sent += 1;
                    crate::metrics::increment_notifications_sent("email");
                    (NotificationStatus::Sent, String::new())
                }
                Err(e) => {
                    summary.failed += 1;
                    crate::metrics::increment_notifications_failed("email");
                    (NotificationStatus::Failed, e)
                }
            };

            let logged = notification_log::ActiveModel {
                alert_id: Set(alert.id),
                recipient_id: Set(recipient.id),
                channel: Set(NotificationChannel::Email),
                status: Set(status),
                timestamp_sent: Set(Utc::now().naive_utc()),
                error_message: Set(error_message),
                ..Default::default()
            }
            .insert(db)
            .await;
            if let Err(e) = logged {
                summary.unlogged += 1;
                error!(
                    alert_id = alert.id,
                    recipient_id = recipient.id,
                    "Failed to record notification: {}", e
                );
            }
        }

        info!(
            alert_id = alert.id,
            sent = summary.sent,
            failed = summary.failed,
            unlogged = summary.unlogged,
            "Notifications dispatched"
        );
        Ok(summary)
    }

    /// Runs [`Notifier::dispatch`] in the background for each alert.
    pub fn spawn_dispatch(&self, db: DatabaseConnection, fired: Vec<alerts::Model>) {
        for alert in fired {
            let notifier = self.clone();
            let db = db.clone();
            let span = tracing::info_span!("notify", alert_id = alert.id);
            tokio::spawn(
                async move {
                    if let Err(e) = notifier.dispatch(&db, &alert).await {
                        error!("Failed to dispatch notifications: {}", e);
                    }
                }
                .instrument(span),
            );
        }
    }
}
