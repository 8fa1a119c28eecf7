//! Read side: active and closed alerts, rules. Plain selects, no locks.

use chrono::NaiveDateTime;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::lifecycle;
use super::types::{AlertPriority, AlertStatus};
use crate::entities::{alert_comment, alerts, prelude::*, user};
use crate::error::Result;

pub use super::rules::list as list_rules;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSnapshot {
    /// `None` once the rule has been deleted.
    pub id: Option<i32>,
    pub name: String,
    pub target_metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub text: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRef {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertView {
    pub id: i32,
    pub alert_rule: RuleSnapshot,
    pub alert_comment: Option<CommentView>,
    pub triggering_value: f64,
    pub timestamp_generated: NaiveDateTime,
    pub timestamp_acknowledged: Option<NaiveDateTime>,
    pub timestamp_closed: Option<NaiveDateTime>,
    pub status: AlertStatus,
    pub priority: AlertPriority,
    pub acknowledged_by: Option<UserRef>,
    pub closed_by: Option<UserRef>,
}

/// Alerts that are not CLOSED, newest first, ties by id ascending.
pub async fn list_active<C: ConnectionTrait>(db: &C) -> Result<Vec<AlertView>> {
    let rows = Alerts::find()
        .filter(alerts::Column::Status.ne(AlertStatus::Closed))
        .order_by_desc(alerts::Column::TimestampGenerated)
        .order_by_asc(alerts::Column::Id)
        .all(db)
        .await?;
    assemble(db, rows).await
}

/// CLOSED alerts, most recently closed first, ties by id ascending.
pub async fn list_closed<C: ConnectionTrait>(db: &C) -> Result<Vec<AlertView>> {
    let rows = Alerts::find()
        .filter(alerts::Column::Status.eq(AlertStatus::Closed))
        .order_by_desc(alerts::Column::TimestampClosed)
        .order_by_asc(alerts::Column::Id)
        .all(db)
        .await?;
    assemble(db, rows).await
}

pub async fn alert_details<C: ConnectionTrait>(db: &C, alert_id: i32) -> Result<AlertView> {
    let alert = lifecycle::get(db, alert_id).await?;
    let mut views = assemble(db, vec![alert]).await?;
    // assemble maps one row to one view
    Ok(views.remove(0))
}

async fn assemble<C: ConnectionTrait>(db: &C, rows: Vec<alerts::Model>) -> Result<Vec<AlertView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let alert_ids: Vec<i32> = rows.iter().map(|a| a.id).collect();
    let comments: HashMap<i32, alert_comment::Model> = AlertComment::find()
        .filter(alert_comment::Column::AlertId.is_in(alert_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.alert_id, c))
        .collect();

    let user_ids: HashSet<i32> = rows
        .iter()
        .flat_map(|a| [a.acknowledged_by, a.closed_by])
        .flatten()
        .collect();
    let users: HashMap<i32, String> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        User::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };
    let user_ref = |id: Option<i32>| {
        id.map(|id| UserRef {
            id,
            username: users.get(&id).cloned().unwrap_or_default(),
        })
    };

    Ok(rows
        .into_iter()
        .map(|alert| AlertView {
            id: alert.id,
            alert_rule: RuleSnapshot {
                id: alert.rule_id,
                name: alert.rule_name,
                target_metric: alert.target_metric,
            },
            alert_comment: comments.get(&alert.id).map(|c| CommentView {
                text: c.text.clone(),
                timestamp: c.timestamp,
            }),
            triggering_value: alert.triggering_value,
            timestamp_generated: alert.timestamp_generated,
            timestamp_acknowledged: alert.timestamp_acknowledged,
            timestamp_closed: alert.timestamp_closed,
            status: alert.status,
            priority: alert.priority,
            acknowledged_by: user_ref(alert.acknowledged_by),
            closed_by: user_ref(alert.closed_by),
        })
        .collect())
}
