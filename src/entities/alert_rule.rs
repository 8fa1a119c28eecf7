use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alarms::types::{AlertPriority, RuleOperator};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "alert_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub target_metric: String,
    pub operator: RuleOperator,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub duration_seconds: i32,
    pub priority: AlertPriority,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::alerts::Entity")]
    Alerts,
}

impl Related<super::alerts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
