use serde::{Deserialize, Serialize};

use crate::auth::{PermissionSet, Role};

/// Authenticated caller context, passed explicitly into every check instead of
/// being read from ambient state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub permissions: PermissionSet,
    /// `None` only for [`Role::SuperAdmin`], which sees every ULB.
    pub ulb_id: Option<String>,
}
