//! Append-only comment ledger, one per alert.

use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::info;

use super::lifecycle::lock_alert;
use crate::entities::{alert_comment, prelude::*};
use crate::error::{AlarmError, Result};

pub const SEPARATOR: &str = "\n\n---\n\n";

pub fn concat(existing: &str, part: &str) -> String {
    let mut text = String::with_capacity(existing.len() + SEPARATOR.len() + part.len());
    text.push_str(existing);
    text.push_str(SEPARATOR);
    text.push_str(part);
    text
}

/// Adds a comment part to an alert, in any status.
pub async fn append(
    db: &DatabaseConnection,
    alert_id: i32,
    text: String,
) -> Result<alert_comment::Model> {
    let ledger = db
        .transaction::<_, alert_comment::Model, AlarmError>(move |txn| {
            Box::pin(async move {
                lock_alert(txn, alert_id).await?;
                append_part(txn, alert_id, &text, Utc::now().naive_utc()).await
            })
        })
        .await?;

    info!(alert_id, "Appended comment to alert");
    Ok(ledger)
}

/// Appends within the caller's transaction. The caller holds the alert row lock.
pub(crate) async fn append_part<C: ConnectionTrait>(
    conn: &C,
    alert_id: i32,
    part: &str,
    now: NaiveDateTime,
) -> Result<alert_comment::Model> {
    if part.trim().is_empty() {
        return Err(AlarmError::validation("comment must not be empty"));
    }

    let existing = AlertComment::find()
        .filter(alert_comment::Column::AlertId.eq(alert_id))
        .one(conn)
        .await?;

    let ledger = match existing {
        Some(ledger) => {
            let text = concat(&ledger.text, part);
            let mut active: alert_comment::ActiveModel = ledger.into();
            active.text = Set(text);
            active.timestamp = Set(now);
            active.update(conn).await?
        }
        None => {
            alert_comment::ActiveModel {
                alert_id: Set(alert_id),
                text: Set(part.to_string()),
                timestamp: Set(now),
                ..Default::default()
            }
            .insert(conn)
            .await?
        }
    };

    Ok(ledger)
}

pub async fn find<C: ConnectionTrait>(
    db: &C,
    alert_id: i32,
) -> Result<Option<alert_comment::Model>> {
    Ok(AlertComment::find()
        .filter(alert_comment::Column::AlertId.eq(alert_id))
        .one(db)
        .await?)
}
