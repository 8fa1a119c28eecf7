pub mod accounts;
pub mod alarms;
pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod telemetry;

pub use error::{AlarmError, Result};
pub use sea_orm;
