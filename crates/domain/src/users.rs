use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::auth::{PermissionSet, Role};
use crate::error::DomainError;
use crate::identity::Session;
use crate::ports::users::UserRepository;
use crate::ulbs::UlbScope;
use crate::util::uuid_v7_without_dashes;

const MAX_NAME_LENGTH: usize = 120;
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    pub ulb_id: Option<String>,
    /// Tokens granted on top of the role defaults.
    pub extra_permissions: Vec<String>,
    /// Hex-encoded SHA-256 of the password; verification lives in infra.
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub is_active: bool,
    pub last_login_ms: Option<i64>,
}

impl UserAccount {
    /// Role defaults plus account-specific grants.
    pub fn effective_permissions(&self) -> PermissionSet {
        let mut permissions = self.role.default_permissions();
        permissions.merge(&PermissionSet::from_tokens(
            self.extra_permissions.iter().cloned(),
        ));
        permissions
    }

    pub fn session(&self) -> Session {
        Session {
            user_id: self.user_id.clone(),
            username: self.name.clone(),
            role: self.role,
            permissions: self.effective_permissions(),
            ulb_id: self.ulb_id.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    pub ulb_id: Option<String>,
    pub extra_permissions: Vec<String>,
    pub password_digest: String,
}

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Look up an active account by email and verify the caller-computed
    /// password digest. Inactive or unknown accounts fail identically.
    pub async fn authenticate(
        &self,
        email: &str,
        password_digest: &str,
        now_ms: i64,
    ) -> DomainResult<UserAccount> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .filter(|user| user.is_active)
            .ok_or(DomainError::Forbidden)?;

        if user.password_digest != password_digest {
            return Err(DomainError::Forbidden);
        }

        let mut user = user;
        user.last_login_ms = Some(now_ms);
        self.repository.update(&user).await
    }

    pub async fn get(&self, user_id: &str) -> DomainResult<UserAccount> {
        self.repository
            .get(user_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Roster visible to the caller: own ULB for scoped sessions, everyone
    /// for SuperAdmin.
    pub async fn list(&self, session: &Session) -> DomainResult<Vec<UserAccount>> {
        let scope = UlbScope::for_session(session)?;
        self.repository.list(scope.filter()).await
    }

    pub async fn create(&self, input: UserCreate) -> DomainResult<UserAccount> {
        let input = validate_user_create(input)?;
        if self
            .repository
            .find_by_email(&input.email)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict);
        }

        let user = UserAccount {
            user_id: uuid_v7_without_dashes(),
            email: input.email,
            name: input.name,
            role: input.role,
            department: input.department,
            ulb_id: input.ulb_id,
            extra_permissions: input.extra_permissions,
            password_digest: input.password_digest,
            is_active: true,
            last_login_ms: None,
        };
        self.repository.create(&user).await
    }

    pub async fn deactivate(&self, user_id: &str) -> DomainResult<UserAccount> {
        let mut user = self.get(user_id).await?;
        user.is_active = false;
        self.repository.update(&user).await
    }
}

fn validate_user_create(input: UserCreate) -> DomainResult<UserCreate> {
    let email = input.email.trim().to_ascii_lowercase();
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
        return Err(DomainError::Validation("invalid email".to_string()));
    }
    let name = input.name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "name must be 1..={MAX_NAME_LENGTH} characters"
        )));
    }
    if input.role.requires_ulb() && input.ulb_id.is_none() {
        return Err(DomainError::Validation(format!(
            "role {} requires a ulb binding",
            input.role.as_str()
        )));
    }
    if input.password_digest.is_empty() {
        return Err(DomainError::Validation(
            "password digest is required".to_string(),
        ));
    }
    Ok(UserCreate {
        email,
        name: name.to_string(),
        ..input
    })
}
