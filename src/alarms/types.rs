//! Enumerations shared by the rule store, the alert lifecycle and the
//! persistence layer. Stored as their string names.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AlarmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleOperator {
    #[sea_orm(string_value = "GREATER_THAN")]
    GreaterThan,
    #[sea_orm(string_value = "LESS_THAN")]
    LessThan,
    #[sea_orm(string_value = "EQUALS")]
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    #[sea_orm(string_value = "LOW")]
    Low,
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    #[sea_orm(string_value = "HIGH")]
    High,
    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    #[sea_orm(string_value = "NEW")]
    New,
    #[sea_orm(string_value = "ACKNOWLEDGED")]
    Acknowledged,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "building_admin")]
    BuildingAdmin,
    #[sea_orm(string_value = "worker")]
    Worker,
    #[sea_orm(string_value = "maintenance_engineer")]
    MaintenanceEngineer,
    #[sea_orm(string_value = "energy_provider")]
    EnergyProvider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    #[sea_orm(string_value = "EMAIL")]
    Email,
}

impl RuleOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::Equals => "EQUALS",
        }
    }
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Acknowledged => "ACKNOWLEDGED",
            Self::Closed => "CLOSED",
        }
    }

    /// Monotonic lifecycle: NEW -> ACKNOWLEDGED -> CLOSED, or NEW -> CLOSED.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Acknowledged) | (Self::New, Self::Closed) | (Self::Acknowledged, Self::Closed)
        )
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildingAdmin => "building_admin",
            Self::Worker => "worker",
            Self::MaintenanceEngineer => "maintenance_engineer",
            Self::EnergyProvider => "energy_provider",
        }
    }
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(RuleOperator, AlertPriority, AlertStatus, Role, NotificationChannel);

impl FromStr for RuleOperator {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "GREATER_THAN" => Ok(Self::GreaterThan),
            "LESS_THAN" => Ok(Self::LessThan),
            "EQUALS" => Ok(Self::Equals),
            other => Err(AlarmError::validation(format!("unknown operator: {other}"))),
        }
    }
}

impl FromStr for AlertPriority {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(AlarmError::validation(format!("unknown priority: {other}"))),
        }
    }
}

impl FromStr for Role {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "building_admin" => Ok(Self::BuildingAdmin),
            "worker" => Ok(Self::Worker),
            "maintenance_engineer" => Ok(Self::MaintenanceEngineer),
            "energy_provider" => Ok(Self::EnergyProvider),
            other => Err(AlarmError::validation(format!("unknown role: {other}"))),
        }
    }
}
