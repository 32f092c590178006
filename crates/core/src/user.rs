//! Users, roles and the fixed roster.

use serde::{Deserialize, Serialize};
use crate::error::ParseError;

/// Role of a rostered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Field staff (NC): works assigned tasks and logs daily activity
    Field,
    /// Assigns tasks, approves leave and locks months
    Management,
}

impl Role {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Field => "field",
            Role::Management => "management",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "field" | "nc" => Ok(Role::Field),
            "management" | "manager" => Ok(Role::Management),
            _ => Err(ParseError::new("role", s)),
        }
    }
}

/// A rostered user. Users are identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Display name, unique within the roster
    pub name: String,

    /// Role
    pub role: Role,
}

impl User {
    /// Create a new user.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// Whether this user holds the management role.
    pub fn is_management(&self) -> bool {
        self.role == Role::Management
    }
}

/// The fixed set of users known to a tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    /// Build a roster from users, in the given order.
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Look a user up by name.
    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name == name)
    }

    /// Whether a user with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All users.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Users holding the given role.
    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &User> {
        self.users.iter().filter(move |u| u.role == role)
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            User::new("A", Role::Field),
            User::new("B", Role::Field),
            User::new("X", Role::Management),
        ])
    }

    #[test]
    fn test_lookup_by_name() {
        let roster = roster();
        assert_eq!(roster.get("X").map(|u| u.role), Some(Role::Management));
        assert!(roster.contains("A"));
        assert!(!roster.contains("Z"));
    }

    #[test]
    fn test_with_role() {
        let roster = roster();
        let field: Vec<_> = roster.with_role(Role::Field).map(|u| u.name.as_str()).collect();
        assert_eq!(field, vec!["A", "B"]);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("NC".parse::<Role>().unwrap(), Role::Field);
        assert_eq!("Management".parse::<Role>().unwrap(), Role::Management);
        assert!("admin".parse::<Role>().is_err());
    }
}
