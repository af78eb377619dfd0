//! Pure access-control decision function.
//!
//! Given a caller session and a set of requirements, decide whether a
//! protected resource is visible. Roles gate whole views, permission tokens
//! gate individual actions; the two axes are checked independently and both
//! must pass. Absent or malformed input always denies (fail closed).

use serde::Serialize;

use crate::auth::Role;
use crate::identity::Session;

/// What a protected resource demands of the caller.
///
/// An empty role list means no role restriction; an empty permission list
/// means no permission check. Permissions use AND semantics.
#[derive(Clone, Debug, Default)]
pub struct AccessRequirements {
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
}

impl AccessRequirements {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn roles<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Role>,
    {
        Self {
            roles: roles.into_iter().collect(),
            permissions: Vec::new(),
        }
    }

    pub fn permission(token: impl Into<String>) -> Self {
        Self {
            roles: Vec::new(),
            permissions: vec![token.into()],
        }
    }

    pub fn and_permission(mut self, token: impl Into<String>) -> Self {
        self.permissions.push(token.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    RoleNotAllowed,
    MissingPermission,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

/// Evaluate `requirements` against `session`.
///
/// Check order is observable through the deny reason: authentication, then
/// role, then permissions. Empty requirements still demand a session; truly
/// public resources skip the evaluator entirely.
pub fn evaluate(session: Option<&Session>, requirements: &AccessRequirements) -> AccessDecision {
    let Some(session) = session else {
        return AccessDecision::Deny(DenyReason::Unauthenticated);
    };

    if !requirements.roles.is_empty() && !requirements.roles.contains(&session.role) {
        return AccessDecision::Deny(DenyReason::RoleNotAllowed);
    }

    if !requirements.permissions.is_empty()
        && !session
            .permissions
            .grants_all(requirements.permissions.iter().map(String::as_str))
    {
        return AccessDecision::Deny(DenyReason::MissingPermission);
    }

    AccessDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PermissionSet;

    fn session(role: Role, permissions: PermissionSet) -> Session {
        Session {
            user_id: "user-1".to_string(),
            username: "user-1".to_string(),
            role,
            permissions,
            ulb_id: (role != Role::SuperAdmin).then(|| "ulb_adi".to_string()),
        }
    }

    #[test]
    fn null_session_always_denies() {
        assert_eq!(
            evaluate(None, &AccessRequirements::none()),
            AccessDecision::Deny(DenyReason::Unauthenticated)
        );
        assert_eq!(
            evaluate(None, &AccessRequirements::permission("dashboard.view")),
            AccessDecision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn wildcard_allows_any_permission_set() {
        let session = session(Role::Admin, PermissionSet::wildcard());
        let requirements = AccessRequirements::permission("issues.manage")
            .and_permission("users.manage")
            .and_permission("made.up.token");
        assert_eq!(
            evaluate(Some(&session), &requirements),
            AccessDecision::Allow
        );
    }

    #[test]
    fn role_mismatch_denies_regardless_of_permissions() {
        // Manager holds the requested permission, but the role gate fails
        // first, so the permission never rescues the request.
        let session = session(
            Role::Manager,
            PermissionSet::from_tokens(["dashboard.view"]),
        );
        let requirements = AccessRequirements {
            roles: vec![Role::Admin, Role::SuperAdmin],
            permissions: vec!["dashboard.view".to_string()],
        };
        assert_eq!(
            evaluate(Some(&session), &requirements),
            AccessDecision::Deny(DenyReason::RoleNotAllowed)
        );
    }

    #[test]
    fn permission_check_uses_and_semantics() {
        let session = session(
            Role::Staff,
            PermissionSet::from_tokens(["dashboard.view", "issues.update"]),
        );
        let one = AccessRequirements::permission("issues.update");
        assert_eq!(evaluate(Some(&session), &one), AccessDecision::Allow);

        let both = AccessRequirements::permission("issues.update")
            .and_permission("issues.manage");
        assert_eq!(
            evaluate(Some(&session), &both),
            AccessDecision::Deny(DenyReason::MissingPermission)
        );
    }

    #[test]
    fn empty_requirements_allow_any_authenticated_session() {
        let session = session(Role::Staff, PermissionSet::new());
        assert_eq!(
            evaluate(Some(&session), &AccessRequirements::none()),
            AccessDecision::Allow
        );
    }

    #[test]
    fn role_and_permission_both_required() {
        let session = session(
            Role::Commissioner,
            PermissionSet::from_tokens(["analytics.view", "reports.view"]),
        );
        let requirements = AccessRequirements {
            roles: vec![Role::SuperAdmin, Role::Admin, Role::Commissioner],
            permissions: vec!["analytics.view".to_string()],
        };
        assert_eq!(
            evaluate(Some(&session), &requirements),
            AccessDecision::Allow
        );
    }
}
