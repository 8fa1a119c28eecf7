//! Rule store. Rules are immutable once created: change means delete and recreate.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;

use super::types::{AlertPriority, RuleOperator};
use crate::entities::{alert_rule, alerts, prelude::*};
use crate::error::{AlarmError, Result};

/// Rule definition as submitted by an administrator. Enumerated fields arrive
/// as their wire names and are checked in [`NewRule::validate`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub target_metric: String,
    pub operator: String,
    #[serde(default)]
    pub threshold_min: Option<f64>,
    #[serde(default)]
    pub threshold_max: Option<f64>,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRule {
    pub name: String,
    pub target_metric: String,
    pub operator: RuleOperator,
    pub threshold_min: Option<f64>,
    pub threshold_max: Option<f64>,
    pub duration_seconds: i32,
    pub priority: AlertPriority,
}

impl NewRule {
    pub fn validate(self) -> Result<ValidRule> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AlarmError::validation("name must not be empty"));
        }
        let target_metric = self.target_metric.trim();
        if target_metric.is_empty() {
            return Err(AlarmError::validation("target_metric must not be empty"));
        }

        let operator: RuleOperator = self.operator.parse()?;
        let priority = match self.priority.as_deref() {
            Some(p) => p.parse()?,
            None => AlertPriority::Medium,
        };

        for (field, value) in [
            ("threshold_min", self.threshold_min),
            ("threshold_max", self.threshold_max),
        ] {
            if matches!(value, Some(v) if !v.is_finite()) {
                return Err(AlarmError::validation(format!("{field} must be a finite number")));
            }
        }

        let duration_seconds = i32::try_from(self.duration_seconds)
            .ok()
            .filter(|d| *d >= 0)
            .ok_or_else(|| {
                AlarmError::validation(format!(
                    "duration_seconds must be between 0 and {}",
                    i32::MAX
                ))
            })?;

        Ok(ValidRule {
            name: name.to_string(),
            target_metric: target_metric.to_string(),
            operator,
            threshold_min: self.threshold_min,
            threshold_max: self.threshold_max,
            duration_seconds,
            priority,
        })
    }
}

pub async fn create(db: &DatabaseConnection, new_rule: NewRule) -> Result<alert_rule::Model> {
    let rule = new_rule.validate()?;

    let rule = alert_rule::ActiveModel {
        name: Set(rule.name),
        target_metric: Set(rule.target_metric),
        operator: Set(rule.operator),
        threshold_min: Set(rule.threshold_min),
        threshold_max: Set(rule.threshold_max),
        duration_seconds: Set(rule.duration_seconds),
        priority: Set(rule.priority),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        rule_id = rule.id,
        metric = %rule.target_metric,
        operator = %rule.operator,
        priority = %rule.priority,
        "Created alert rule {}",
        rule.name
    );
    crate::metrics::rule_created();
    Ok(rule)
}

/// Deletes a rule. Alerts it generated keep their snapshot and lose the reference.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    db.transaction::<_, (), AlarmError>(move |txn| {
        Box::pin(async move {
            Alerts::update_many()
                .col_expr(alerts::Column::RuleId, Expr::value(Option::<i32>::None))
                .filter(alerts::Column::RuleId.eq(id))
                .exec(txn)
                .await?;

            let res = AlertRule::delete_by_id(id).exec(txn).await?;
            if res.rows_affected == 0 {
                return Err(AlarmError::NotFound {
                    entity: "alert rule",
                    id,
                });
            }
            Ok(())
        })
    })
    .await?;

    info!(rule_id = id, "Deleted alert rule");
    crate::metrics::rule_deleted();
    Ok(())
}

pub async fn get<C: ConnectionTrait>(db: &C, id: i32) -> Result<alert_rule::Model> {
    AlertRule::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AlarmError::NotFound {
            entity: "alert rule",
            id,
        })
}

/// All rules in id (creation) order.
pub async fn list<C: ConnectionTrait>(db: &C) -> Result<Vec<alert_rule::Model>> {
    Ok(AlertRule::find()
        .order_by_asc(alert_rule::Column::Id)
        .all(db)
        .await?)
}

pub async fn list_for_metric<C: ConnectionTrait>(
    db: &C,
    metric: &str,
) -> Result<Vec<alert_rule::Model>> {
    Ok(AlertRule::find()
        .filter(alert_rule::Column::TargetMetric.eq(metric))
        .order_by_asc(alert_rule::Column::Id)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn high_usage() -> NewRule {
        NewRule {
            name: "High usage".into(),
            target_metric: "power".into(),
            operator: "GREATER_THAN".into(),
            threshold_min: None,
            threshold_max: Some(100.0),
            duration_seconds: 0,
            priority: Some("HIGH".into()),
        }
    }

    #[test]
    fn accepts_well_formed_rule() {
        let rule = high_usage().validate().unwrap();
        assert_eq!(rule.operator, RuleOperator::GreaterThan);
        assert_eq!(rule.priority, AlertPriority::High);
        assert_eq!(rule.threshold_max, Some(100.0));
    }

    #[test]
    fn priority_defaults_to_medium() {
        let rule = NewRule {
            priority: None,
            ..high_usage()
        }
        .validate()
        .unwrap();
        assert_eq!(rule.priority, AlertPriority::Medium);
    }

    #[test]
    fn rejects_blank_name_and_metric() {
        let blank_name = NewRule {
            name: "   ".into(),
            ..high_usage()
        };
        assert!(matches!(blank_name.validate(), Err(AlarmError::Validation(_))));

        let blank_metric = NewRule {
            target_metric: String::new(),
            ..high_usage()
        };
        assert!(matches!(blank_metric.validate(), Err(AlarmError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_enumerations() {
        let bad_operator = NewRule {
            operator: "BETWEEN".into(),
            ..high_usage()
        };
        assert!(matches!(bad_operator.validate(), Err(AlarmError::Validation(_))));

        let bad_priority = NewRule {
            priority: Some("URGENT".into()),
            ..high_usage()
        };
        assert!(matches!(bad_priority.validate(), Err(AlarmError::Validation(_))));
    }

    #[test]
    fn rejects_negative_duration_and_nan_threshold() {
        let negative = NewRule {
            duration_seconds: -1,
            ..high_usage()
        };
        assert!(matches!(negative.validate(), Err(AlarmError::Validation(_))));

        let nan = NewRule {
            threshold_max: Some(f64::NAN),
            ..high_usage()
        };
        assert!(matches!(nan.validate(), Err(AlarmError::Validation(_))));
    }

    #[test]
    fn missing_threshold_is_accepted_at_creation() {
        let rule = NewRule {
            threshold_max: None,
            ..high_usage()
        }
        .validate()
        .unwrap();
        assert_eq!(rule.threshold_max, None);
    }
}
