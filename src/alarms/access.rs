//! Role based access control, checked at the HTTP boundary.

use serde::Serialize;

use super::types::{AlertPriority, Role};
use crate::error::{AlarmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewAlerts,
    /// Acknowledge, close and manually raise alerts.
    HandleAlerts,
    CommentAlerts,
    ManageRules,
    IngestSamples,
    ManageUsers,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewAlerts => "view_alerts",
            Self::HandleAlerts => "handle_alerts",
            Self::CommentAlerts => "comment_alerts",
            Self::ManageRules => "manage_rules",
            Self::IngestSamples => "ingest_samples",
            Self::ManageUsers => "manage_users",
        }
    }
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            Role::BuildingAdmin => true,
            Role::MaintenanceEngineer => {
                matches!(capability, ViewAlerts | HandleAlerts | CommentAlerts)
            }
            Role::Worker | Role::EnergyProvider => matches!(capability, ViewAlerts),
        }
    }

    /// Which roles hear about an alert of the given priority.
    pub fn receives(&self, priority: AlertPriority) -> bool {
        match priority {
            AlertPriority::Critical => true,
            AlertPriority::High => {
                matches!(self, Role::BuildingAdmin | Role::MaintenanceEngineer)
            }
            AlertPriority::Medium => matches!(
                self,
                Role::BuildingAdmin | Role::MaintenanceEngineer | Role::EnergyProvider
            ),
            AlertPriority::Low => matches!(self, Role::BuildingAdmin),
        }
    }
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                role = %self.role,
                capability = capability.as_str(),
                "capability denied"
            );
            Err(AlarmError::Forbidden(format!(
                "role {} lacks {}",
                self.role,
                capability.as_str()
            )))
        }
    }
}
