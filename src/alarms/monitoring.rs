//! Sample inspection: evaluate every rule for a metric, track how long each
//! violation has lasted and raise alerts once `duration_seconds` is reached.

use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{evaluator, lifecycle, rules};
use crate::entities::{alert_rule, alerts};
use crate::error::{AlarmError, Result};

pub type SharedTracker = Arc<Mutex<ViolationTracker>>;

#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    pub metric: String,
    pub value: f64,
    /// When the value was measured. Defaults to now.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    since: NaiveDateTime,
    fired: bool,
}

/// Per-rule memory of ongoing violations, keyed by rule id.
#[derive(Debug, Default)]
pub struct ViolationTracker {
    pending: HashMap<i32, Pending>,
}

impl ViolationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedTracker {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Feeds one evaluation result. Returns `true` exactly once per violation
    /// episode, when it has lasted at least the rule's `duration_seconds`.
    pub fn observe(&mut self, rule: &alert_rule::Model, violated: bool, at: NaiveDateTime) -> bool {
        if !violated {
            self.pending.remove(&rule.id);
            return false;
        }

        let entry = self.pending.entry(rule.id).or_insert(Pending {
            since: at,
            fired: false,
        });
        if entry.fired {
            return false;
        }

        let required = Duration::seconds(i64::from(rule.duration_seconds.max(0)));
        if at - entry.since >= required {
            entry.fired = true;
            return true;
        }
        false
    }

    /// Undoes a firing whose alert could not be stored. The episode keeps its
    /// start, so the next violating sample fires again.
    pub fn rearm(&mut self, rule_id: i32) {
        if let Some(entry) = self.pending.get_mut(&rule_id) {
            entry.fired = false;
        }
    }

    pub fn forget(&mut self, rule_id: i32) {
        self.pending.remove(&rule_id);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Rules on `metric` violated by `value`. Misconfigured rules are skipped.
pub async fn evaluate_rules(
    db: &DatabaseConnection,
    metric: &str,
    value: f64,
) -> Result<Vec<alert_rule::Model>> {
    let mut violated = Vec::new();
    for rule in rules::list_for_metric(db, metric).await? {
        if let Some(true) = checked(&rule, value)? {
            violated.push(rule);
        }
    }
    Ok(violated)
}

/// Evaluates all rules for the sample's metric and generates an alert for each
/// rule whose violation became sustained with this sample.
pub async fn inspect(
    db: &DatabaseConnection,
    tracker: &Mutex<ViolationTracker>,
    sample: Sample,
) -> Result<Vec<alerts::Model>> {
    let metric = sample.metric.trim();
    if metric.is_empty() {
        return Err(AlarmError::validation("metric must not be empty"));
    }
    if !sample.value.is_finite() {
        return Err(AlarmError::validation("value must be a finite number"));
    }
    let at = sample.timestamp.unwrap_or_else(|| Utc::now().naive_utc());

    let candidates = rules::list_for_metric(db, metric).await?;
    let firing: Vec<alert_rule::Model> = {
        let mut tracker = tracker.lock().await;
        let mut firing = Vec::new();
        for rule in candidates {
            let Some(violated) = checked(&rule, sample.value)? else {
                tracker.forget(rule.id);
                continue;
            };
            if tracker.observe(&rule, violated, at) {
                firing.push(rule);
            }
        }
        firing
    };

    debug!(metric, value = sample.value, firing = firing.len(), "Inspected sample");

    let mut generated = Vec::with_capacity(firing.len());
    for (idx, rule) in firing.iter().enumerate() {
        match lifecycle::generate(db, rule, sample.value, Some(at)).await {
            Ok(alert) => generated.push(alert),
            Err(e) => {
                let mut tracker = tracker.lock().await;
                for unsaved in &firing[idx..] {
                    tracker.rearm(unsaved.id);
                }
                warn!(rule_id = rule.id, "Alert not stored, rule rearmed: {}", e);
                return Err(e);
            }
        }
    }
    Ok(generated)
}

/// `Ok(None)` for a rule that cannot be evaluated; other errors propagate.
fn checked(rule: &alert_rule::Model, value: f64) -> Result<Option<bool>> {
    match evaluator::evaluate(rule, value) {
        Ok(v) => Ok(Some(v)),
        Err(AlarmError::Configuration { rule_id, reason }) => {
            warn!(rule_id, "Skipping misconfigured rule: {}", reason);
            crate::metrics::rule_misconfigured(rule_id);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
