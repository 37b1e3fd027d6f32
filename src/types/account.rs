//! Account and subscription plan types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DashError;

/// Plan shown for users that were never assigned one
pub const NO_PLAN: &str = "No Plan";

/// Display name shown for users without `displayName`
pub const NO_NAME: &str = "No Name";

/// Fields read from a `users` document
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UserRecord {
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub current_plan: Option<String>,
    #[serde(default)]
    pub trial_activated_date: Option<String>,
    #[serde(default)]
    pub last_plan_upgrade_date: Option<String>,
}

/// A user id paired with the name operators pick from
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
}

/// Plans an operator may assign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Plan {
    Trial,
    Inactive,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Trial => "Trial",
            Plan::Inactive => "Inactive",
            Plan::Premium => "Premium",
        }
    }
}

impl FromStr for Plan {
    type Err = DashError;

    /// Case-insensitive: "trial", "TRIAL" and "Trial" are all accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trial" => Ok(Plan::Trial),
            "inactive" => Ok(Plan::Inactive),
            "premium" => Ok(Plan::Premium),
            _ => Err(DashError::InvalidPlan(s.to_string())),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing plan state of one user
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanState {
    /// Stored plan string, `"No Plan"` if unset
    pub plan: String,
    /// Whole days left in the trial window, never negative
    pub days_left: u32,
}

impl Default for PlanState {
    fn default() -> Self {
        Self {
            plan: NO_PLAN.to_string(),
            days_left: 0,
        }
    }
}

/// Outcome of a plan change applied to the store
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanUpdate {
    pub user_id: String,
    /// Plan string exactly as written to `current_plan`
    pub current_plan: String,
    pub plan: Plan,
    /// Set when the patch restarted the trial clock
    pub trial_activated_date: Option<String>,
    /// Set when the patch recorded an upgrade
    pub last_plan_upgrade_date: Option<String>,
}
