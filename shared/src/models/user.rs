//! User and role models

use serde::{Deserialize, Serialize};

/// Role of the signed-in staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    #[default]
    Staff,
    /// Any role the client does not know about
    #[serde(other)]
    Other,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
            UserRole::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "manager" => UserRole::Manager,
            "staff" => UserRole::Staff,
            _ => UserRole::Other,
        }
    }

    /// Admin review and close are admin-only
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// The acting user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl CurrentUser {
    pub fn new(name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: None,
            name: name.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(UserRole::from_str("Admin"), UserRole::Admin);
        assert_eq!(UserRole::from_str(" staff "), UserRole::Staff);
        assert_eq!(UserRole::from_str("grower"), UserRole::Other);
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Manager.is_admin());
    }

    #[test]
    fn test_unknown_role_deserializes_as_other() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"name": "Kai", "role": "budtender"}"#).unwrap();
        assert_eq!(user.role, UserRole::Other);
    }
}
