pub use super::alert_comment::Entity as AlertComment;
pub use super::alert_rule::Entity as AlertRule;
pub use super::alerts::Entity as Alerts;
pub use super::notification_log::Entity as NotificationLog;
pub use super::session::Entity as Session;
pub use super::user::Entity as User;
