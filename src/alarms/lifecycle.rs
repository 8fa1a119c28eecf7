//! Alert lifecycle: NEW -> ACKNOWLEDGED -> CLOSED, or NEW -> CLOSED.
//!
//! Every transition runs in its own transaction holding an exclusive lock on
//! the alert row, so concurrent acknowledge/close calls on one alert are
//! serialized and a failed call leaves the row untouched.

use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{info, warn};

use super::access::Actor;
use super::ledger;
use super::rules;
use super::types::AlertStatus;
use crate::entities::{alert_rule, alerts, prelude::*};
use crate::error::{AlarmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Acknowledge,
    Close,
}

impl Transition {
    fn target(self) -> AlertStatus {
        match self {
            Self::Acknowledge => AlertStatus::Acknowledged,
            Self::Close => AlertStatus::Closed,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledged",
            Self::Close => "closed",
        }
    }
}

/// Creates a NEW alert for `rule`. Priority and rule identity are copied so
/// later rule deletion does not change the alert.
pub async fn generate<C: ConnectionTrait>(
    db: &C,
    rule: &alert_rule::Model,
    triggering_value: f64,
    timestamp: Option<NaiveDateTime>,
) -> Result<alerts::Model> {
    if !triggering_value.is_finite() {
        return Err(AlarmError::validation(
            "triggering_value must be a finite number",
        ));
    }

    let alert = alerts::ActiveModel {
        rule_id: Set(Some(rule.id)),
        rule_name: Set(rule.name.clone()),
        target_metric: Set(rule.target_metric.clone()),
        triggering_value: Set(triggering_value),
        timestamp_generated: Set(timestamp.unwrap_or_else(|| Utc::now().naive_utc())),
        timestamp_acknowledged: Set(None),
        timestamp_closed: Set(None),
        status: Set(AlertStatus::New),
        priority: Set(rule.priority),
        acknowledged_by: Set(None),
        closed_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        alert_id = alert.id,
        rule_id = rule.id,
        priority = %alert.priority,
        triggering_value,
        "Generated alert for rule {}",
        rule.name
    );
    crate::metrics::alert_generated(alert.priority);
    Ok(alert)
}

/// Operator-raised alert against an existing rule.
pub async fn create_manual(
    db: &DatabaseConnection,
    rule_id: i32,
    triggering_value: f64,
    timestamp: Option<NaiveDateTime>,
) -> Result<alerts::Model> {
    let rule = rules::get(db, rule_id).await?;
    generate(db, &rule, triggering_value, timestamp).await
}

pub async fn acknowledge(
    db: &DatabaseConnection,
    alert_id: i32,
    actor: &Actor,
    comment: Option<String>,
) -> Result<alerts::Model> {
    transition(db, alert_id, actor, comment, Transition::Acknowledge).await
}

pub async fn close(
    db: &DatabaseConnection,
    alert_id: i32,
    actor: &Actor,
    comment: Option<String>,
) -> Result<alerts::Model> {
    transition(db, alert_id, actor, comment, Transition::Close).await
}

pub async fn get<C: ConnectionTrait>(db: &C, alert_id: i32) -> Result<alerts::Model> {
    Alerts::find_by_id(alert_id)
        .one(db)
        .await?
        .ok_or(AlarmError::NotFound {
            entity: "alert",
            id: alert_id,
        })
}

/// Loads the alert with `SELECT ... FOR UPDATE`. Must run inside a transaction.
pub(crate) async fn lock_alert<C: ConnectionTrait>(conn: &C, alert_id: i32) -> Result<alerts::Model> {
    Alerts::find_by_id(alert_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(AlarmError::NotFound {
            entity: "alert",
            id: alert_id,
        })
}

async fn transition(
    db: &DatabaseConnection,
    alert_id: i32,
    actor: &Actor,
    comment: Option<String>,
    step: Transition,
) -> Result<alerts::Model> {
    // Blank optional comments count as no comment.
    let comment = comment.filter(|c| !c.trim().is_empty());
    let actor_id = actor.user_id;

    let result = db
        .transaction::<_, alerts::Model, AlarmError>(move |txn| {
            Box::pin(async move {
                let current = lock_alert(txn, alert_id).await?;
                if !current.status.can_transition_to(step.target()) {
                    return Err(AlarmError::InvalidState {
                        id: alert_id,
                        action: step.verb(),
                        status: current.status,
                    });
                }

                let now = Utc::now().naive_utc();
                let mut active: alerts::ActiveModel = current.into();
                active.status = Set(step.target());
                match step {
                    Transition::Acknowledge => {
                        active.timestamp_acknowledged = Set(Some(now));
                        active.acknowledged_by = Set(Some(actor_id));
                    }
                    Transition::Close => {
                        active.timestamp_closed = Set(Some(now));
                        active.closed_by = Set(Some(actor_id));
                    }
                }
                let updated = active.update(txn).await?;

                if let Some(text) = comment {
                    ledger::append_part(txn, alert_id, &text, now).await?;
                }
                Ok(updated)
            })
        })
        .await
        .map_err(AlarmError::from);

    let updated = match result {
        Ok(alert) => alert,
        Err(e) => {
            warn!(alert_id, user_id = actor_id, "Alert could not be {}: {}", step.verb(), e);
            return Err(e);
        }
    };

    info!(
        alert_id,
        user_id = actor_id,
        username = %actor.username,
        status = %updated.status,
        "Alert {} by {}",
        step.verb(),
        actor.username
    );

    match step {
        Transition::Acknowledge => {
            crate::metrics::alert_acknowledged();
            if let Some(at) = updated.timestamp_acknowledged {
                let waited = at - updated.timestamp_generated;
                crate::metrics::record_acknowledgment_time(
                    waited.num_milliseconds().max(0) as f64 / 1000.0,
                );
            }
        }
        Transition::Close => crate::metrics::alert_closed(),
    }

    Ok(updated)
}
