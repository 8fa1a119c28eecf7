pub mod alert_comment;
pub mod alert_rule;
pub mod alerts;
pub mod notification_log;
pub mod session;
pub mod user;

pub use alert_comment::Entity as AlertComment;
pub use alert_rule::Entity as AlertRule;
pub use alerts::Entity as Alerts;
pub use notification_log::Entity as NotificationLog;
pub use session::Entity as Session;
pub use user::Entity as User;

pub mod prelude;
