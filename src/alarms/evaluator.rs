//! Stateless rule evaluation. How long a violation lasted is the caller's
//! business; see [`super::monitoring::ViolationTracker`].

use super::types::RuleOperator;
use crate::entities::alert_rule;
use crate::error::{AlarmError, Result};

/// Returns whether `sample` violates `rule`.
///
/// A rule missing the threshold its operator reads is unusable and yields
/// [`AlarmError::Configuration`] instead of a silent `false`. `EQUALS` compares
/// exactly, with no tolerance.
pub fn evaluate(rule: &alert_rule::Model, sample: f64) -> Result<bool> {
    let threshold = required_threshold(rule)?;

    if !sample.is_finite() {
        return Err(AlarmError::validation(format!(
            "sample for rule {} is not a finite number",
            rule.id
        )));
    }

    Ok(match rule.operator {
        RuleOperator::GreaterThan => sample > threshold,
        RuleOperator::LessThan => sample < threshold,
        RuleOperator::Equals => sample == threshold,
    })
}

fn required_threshold(rule: &alert_rule::Model) -> Result<f64> {
    let (field, value) = match rule.operator {
        RuleOperator::GreaterThan => ("threshold_max", rule.threshold_max),
        RuleOperator::LessThan | RuleOperator::Equals => ("threshold_min", rule.threshold_min),
    };

    value.ok_or_else(|| AlarmError::Configuration {
        rule_id: rule.id,
        reason: format!("{} requires {}", rule.operator, field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::types::AlertPriority;

    fn rule(operator: RuleOperator, min: Option<f64>, max: Option<f64>) -> alert_rule::Model {
        alert_rule::Model {
            id: 1,
            name: "rule".into(),
            target_metric: "power".into(),
            operator,
            threshold_min: min,
            threshold_max: max,
            duration_seconds: 0,
            priority: AlertPriority::Medium,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn greater_than_uses_threshold_max() {
        let r = rule(RuleOperator::GreaterThan, Some(500.0), Some(100.0));
        assert!(evaluate(&r, 150.0).unwrap());
        assert!(!evaluate(&r, 100.0).unwrap());
        assert!(!evaluate(&r, 50.0).unwrap());
    }

    #[test]
    fn less_than_uses_threshold_min() {
        let r = rule(RuleOperator::LessThan, Some(10.0), Some(-100.0));
        assert!(evaluate(&r, 9.5).unwrap());
        assert!(!evaluate(&r, 10.0).unwrap());
    }

    #[test]
    fn equals_is_exact() {
        let r = rule(RuleOperator::Equals, Some(42.0), None);
        assert!(evaluate(&r, 42.0).unwrap());
        assert!(!evaluate(&r, 42.0001).unwrap());
    }

    #[test]
    fn zero_is_a_usable_threshold() {
        let r = rule(RuleOperator::LessThan, Some(0.0), None);
        assert!(evaluate(&r, -0.5).unwrap());

        let r = rule(RuleOperator::GreaterThan, None, Some(0.0));
        assert!(evaluate(&r, 0.1).unwrap());
    }

    #[test]
    fn missing_threshold_is_a_configuration_error() {
        let cases = [
            rule(RuleOperator::GreaterThan, Some(1.0), None),
            rule(RuleOperator::LessThan, None, Some(1.0)),
            rule(RuleOperator::Equals, None, Some(1.0)),
        ];
        for r in &cases {
            for sample in [-1e9, 0.0, 1.0, 1e9] {
                assert!(matches!(
                    evaluate(r, sample),
                    Err(AlarmError::Configuration { rule_id: 1, .. })
                ));
            }
        }
    }

    #[test]
    fn non_finite_sample_is_rejected() {
        let r = rule(RuleOperator::GreaterThan, None, Some(1.0));
        assert!(matches!(evaluate(&r, f64::NAN), Err(AlarmError::Validation(_))));
        assert!(matches!(
            evaluate(&r, f64::INFINITY),
            Err(AlarmError::Validation(_))
        ));
    }
}
