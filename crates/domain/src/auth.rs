use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Wildcard token granting every permission.
pub const PERMISSION_WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Commissioner,
    Staff,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "commissioner" => Some(Role::Commissioner),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Commissioner => "commissioner",
            Role::Staff => "staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// SuperAdmin operates across every ULB; all other roles are bound to one.
    pub fn requires_ulb(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }

    /// Baseline capability grants for a role. Individual accounts may carry
    /// extra tokens on top of these.
    pub fn default_permissions(&self) -> PermissionSet {
        match self {
            Role::SuperAdmin | Role::Admin => PermissionSet::wildcard(),
            Role::Manager => PermissionSet::from_tokens([
                "dashboard.view",
                "issues.manage",
                "issues.assign",
                "community.moderate",
                "reports.view",
                "analytics.view",
            ]),
            Role::Commissioner => {
                PermissionSet::from_tokens(["dashboard.view", "reports.view", "analytics.view"])
            }
            Role::Staff => {
                PermissionSet::from_tokens(["dashboard.view", "issues.update", "community.view"])
            }
        }
    }
}

/// Set of opaque capability tokens. The literal `"*"` grants everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    tokens: HashSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wildcard() -> Self {
        Self::from_tokens([PERMISSION_WILDCARD])
    }

    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, token: impl Into<String>) {
        self.tokens.insert(token.into());
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.tokens.contains(PERMISSION_WILDCARD)
    }

    pub fn grants(&self, token: &str) -> bool {
        self.has_wildcard() || self.tokens.contains(token)
    }

    /// AND semantics: every requested token must be granted.
    pub fn grants_all<'a, I>(&self, tokens: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens.into_iter().all(|token| self.grants(token))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn merge(&mut self, other: &PermissionSet) {
        for token in other.tokens() {
            self.tokens.insert(token.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_round_trips() {
        for role in [
            Role::SuperAdmin,
            Role::Admin,
            Role::Manager,
            Role::Commissioner,
            Role::Staff,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("citizen"), None);
    }

    #[test]
    fn wildcard_grants_everything() {
        let perms = PermissionSet::wildcard();
        assert!(perms.grants("dashboard.view"));
        assert!(perms.grants("anything.at.all"));
        assert!(perms.grants_all(["a", "b", "c"]));
    }

    #[test]
    fn grants_all_requires_every_token() {
        let perms = PermissionSet::from_tokens(["dashboard.view", "issues.update"]);
        assert!(perms.grants_all(["dashboard.view"]));
        assert!(perms.grants_all(["dashboard.view", "issues.update"]));
        assert!(!perms.grants_all(["dashboard.view", "issues.manage"]));
    }

    #[test]
    fn staff_defaults_lack_management_grants() {
        let perms = Role::Staff.default_permissions();
        assert!(perms.grants("issues.update"));
        assert!(!perms.grants("issues.manage"));
        assert!(!perms.has_wildcard());
    }

    #[test]
    fn admin_defaults_are_wildcard() {
        assert!(Role::Admin.default_permissions().has_wildcard());
        assert!(Role::SuperAdmin.default_permissions().has_wildcard());
    }
}
