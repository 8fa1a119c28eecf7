//! Alarm core: rules, evaluation, alert lifecycle, comment ledger and listing.

pub mod access;
pub mod evaluator;
pub mod ledger;
pub mod lifecycle;
pub mod listing;
pub mod monitoring;
pub mod rules;
pub mod types;

pub use access::{Actor, Capability};
pub use monitoring::{SharedTracker, ViolationTracker};
pub use types::{AlertPriority, AlertStatus, Role, RuleOperator};
