use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alarms::types::{AlertPriority, AlertStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Cleared when the rule is deleted; the snapshot below survives.
    pub rule_id: Option<i32>,
    pub rule_name: String,
    pub target_metric: String,
    pub triggering_value: f64,
    pub timestamp_generated: DateTime,
    pub timestamp_acknowledged: Option<DateTime>,
    pub timestamp_closed: Option<DateTime>,
    pub status: AlertStatus,
    pub priority: AlertPriority,
    pub acknowledged_by: Option<i32>,
    pub closed_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert_rule::Entity",
        from = "Column::RuleId",
        to = "super::alert_rule::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    AlertRule,
    #[sea_orm(has_one = "super::alert_comment::Entity")]
    AlertComment,
    #[sea_orm(has_many = "super::notification_log::Entity")]
    NotificationLog,
}

impl Related<super::alert_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertRule.def()
    }
}

impl Related<super::alert_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertComment.def()
    }
}

impl Related<super::notification_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
