use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::Session;
use crate::ports::ulbs::UlbRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UlbKind {
    MunicipalCorporation,
    Municipality,
    NagarPanchayat,
}

/// Urban Local Body: the tenant boundary. Every issue, event, and non-admin
/// user belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ulb {
    pub ulb_id: String,
    pub name: String,
    pub code: String,
    pub district: String,
    pub state: String,
    pub kind: UlbKind,
}

/// Which ULBs a session may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UlbScope {
    All,
    Single(String),
}

impl UlbScope {
    pub fn for_session(session: &Session) -> DomainResult<Self> {
        match &session.ulb_id {
            None if !session.role.requires_ulb() => Ok(UlbScope::All),
            None => Err(DomainError::Validation(format!(
                "role {} requires a ulb binding",
                session.role.as_str()
            ))),
            Some(ulb_id) => Ok(UlbScope::Single(ulb_id.clone())),
        }
    }

    pub fn permits(&self, ulb_id: &str) -> bool {
        match self {
            UlbScope::All => true,
            UlbScope::Single(own) => own == ulb_id,
        }
    }

    /// ULB filter to push down into repository queries.
    pub fn filter(&self) -> Option<&str> {
        match self {
            UlbScope::All => None,
            UlbScope::Single(own) => Some(own.as_str()),
        }
    }

    /// Resolve the ULB a new record lands in: scoped sessions may only write
    /// their own ULB, all-scope sessions must name one explicitly.
    pub fn resolve_target(&self, requested: Option<&str>) -> DomainResult<String> {
        match (self, requested) {
            (UlbScope::Single(own), None) => Ok(own.clone()),
            (UlbScope::Single(own), Some(requested)) if own == requested => Ok(own.clone()),
            (UlbScope::Single(_), Some(_)) => Err(DomainError::Forbidden),
            (UlbScope::All, Some(requested)) => Ok(requested.to_string()),
            (UlbScope::All, None) => Err(DomainError::Validation(
                "ulb_id is required for cross-ulb sessions".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct UlbService {
    repository: Arc<dyn UlbRepository>,
}

impl UlbService {
    pub fn new(repository: Arc<dyn UlbRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self, ulb_id: &str) -> DomainResult<Ulb> {
        self.repository.get(ulb_id).await?.ok_or(DomainError::NotFound)
    }

    pub async fn list(&self) -> DomainResult<Vec<Ulb>> {
        self.repository.list().await
    }

    pub async fn register(&self, ulb: Ulb) -> DomainResult<Ulb> {
        if ulb.ulb_id.is_empty() || ulb.name.is_empty() || ulb.code.is_empty() {
            return Err(DomainError::Validation(
                "ulb id, name, and code are required".to_string(),
            ));
        }
        self.repository.upsert(&ulb).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PermissionSet, Role};

    fn session(role: Role, ulb_id: Option<&str>) -> Session {
        Session {
            user_id: "u-1".to_string(),
            username: "u-1".to_string(),
            role,
            permissions: PermissionSet::new(),
            ulb_id: ulb_id.map(str::to_string),
        }
    }

    #[test]
    fn super_admin_without_ulb_sees_all() {
        let scope = UlbScope::for_session(&session(Role::SuperAdmin, None)).expect("scope");
        assert_eq!(scope, UlbScope::All);
        assert!(scope.permits("ulb_adi"));
        assert!(scope.filter().is_none());
    }

    #[test]
    fn scoped_role_without_ulb_is_invalid() {
        assert!(UlbScope::for_session(&session(Role::Staff, None)).is_err());
    }

    #[test]
    fn scoped_session_only_permits_own_ulb() {
        let scope = UlbScope::for_session(&session(Role::Manager, Some("ulb_adi"))).expect("scope");
        assert!(scope.permits("ulb_adi"));
        assert!(!scope.permits("ulb_bar"));
    }

    #[test]
    fn resolve_target_rejects_cross_ulb_writes() {
        let scope = UlbScope::Single("ulb_adi".to_string());
        assert_eq!(scope.resolve_target(None).unwrap(), "ulb_adi");
        assert_eq!(scope.resolve_target(Some("ulb_adi")).unwrap(), "ulb_adi");
        assert!(matches!(
            scope.resolve_target(Some("ulb_bar")),
            Err(DomainError::Forbidden)
        ));
    }

    #[test]
    fn resolve_target_requires_explicit_ulb_for_all_scope() {
        let scope = UlbScope::All;
        assert_eq!(scope.resolve_target(Some("ulb_bar")).unwrap(), "ulb_bar");
        assert!(scope.resolve_target(None).is_err());
    }
}
