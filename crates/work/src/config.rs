//! Tracker configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! built-in roster and allowances.

use std::collections::HashSet;
use std::path::Path;
use serde::{Deserialize, Serialize};
use ncwork_core::{LeaveAllowance, Role, Roster, User};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Roster has no users
    #[error("roster is empty")]
    EmptyRoster,

    /// A user has a blank name
    #[error("roster contains a user with an empty name")]
    EmptyName,

    /// Two users share a name
    #[error("duplicate user in roster: {0}")]
    DuplicateUser(String),

    /// Window of zero days would forbid every log
    #[error("editable_window_days must be at least 1")]
    ZeroWindow,
}

/// How a second work log for the same user and day is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogPolicy {
    /// Append every entry
    #[default]
    Append,
    /// Update the day's existing work log in place
    Upsert,
    /// Reject the second entry
    Strict,
}

/// Work tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkConfig {
    /// Users and their roles
    pub roster: Roster,

    /// Leave each user starts with
    pub leave_allowance: LeaveAllowance,

    /// Trailing days (including today) in which logs may be written;
    /// `None` disables the bound
    pub editable_window_days: Option<u32>,

    /// Duplicate work log handling
    pub log_policy: LogPolicy,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            leave_allowance: LeaveAllowance::default(),
            editable_window_days: Some(7),
            log_policy: LogPolicy::Append,
        }
    }
}

impl WorkConfig {
    /// Parse and validate configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: WorkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check roster and window sanity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        for user in self.roster.users() {
            if user.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(user.name.as_str()) {
                return Err(ConfigError::DuplicateUser(user.name.clone()));
            }
        }
        if self.editable_window_days == Some(0) {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}

fn default_roster() -> Roster {
    let field = ["Rishabh", "Subho", "Kunal"];
    let management = ["Akshay", "Narendra", "Vatsal"];
    Roster::new(
        field
            .iter()
            .map(|name| User::new(*name, Role::Field))
            .chain(management.iter().map(|name| User::new(*name, Role::Management)))
            .collect(),
    )
}
