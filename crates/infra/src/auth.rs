use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use jansetu_domain::auth::{PermissionSet, Role};
use jansetu_domain::identity::Session;
use jansetu_domain::users::UserAccount;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("invalid token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
    #[error("token carries an unknown role: {0}")]
    UnknownRole(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: String,
    pub perms: Vec<String>,
    pub ulb: Option<String>,
    pub exp: usize,
}

/// Mints and verifies HS256 session tokens. The token carries the whole
/// session (role, permissions, ULB binding) so request handling never needs a
/// user lookup.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn issue(&self, user: &UserAccount, now_ms: i64) -> Result<String, TokenError> {
        let session = user.session();
        let claims = Claims {
            sub: session.user_id,
            name: session.username,
            role: session.role.as_str().to_string(),
            perms: session.permissions.tokens().map(str::to_string).collect(),
            ulb: session.ulb_id,
            exp: (now_ms / 1_000) as usize + self.ttl_secs as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<Session, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(TokenError::Decode)?;
        session_from_claims(data.claims)
    }
}

fn session_from_claims(claims: Claims) -> Result<Session, TokenError> {
    let role = Role::parse(&claims.role).ok_or_else(|| TokenError::UnknownRole(claims.role))?;
    Ok(Session {
        user_id: claims.sub,
        username: claims.name,
        role,
        permissions: PermissionSet::from_tokens(claims.perms),
        ulb_id: claims.ulb,
    })
}

/// Hex SHA-256 of a password. Accounts store the digest, never the password.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_user() -> UserAccount {
        UserAccount {
            user_id: "u-1".to_string(),
            email: "manager@jharkhandmc.gov.in".to_string(),
            name: "Department Manager".to_string(),
            role: Role::Manager,
            department: Some("Public Works".to_string()),
            ulb_id: Some("ulb_adi".to_string()),
            extra_permissions: vec![],
            password_digest: password_digest("demo123"),
            is_active: true,
            last_login_ms: None,
        }
    }

    #[test]
    fn issued_token_round_trips_to_a_session() {
        let service = TokenService::new("test-secret", 3_600);
        let now_ms = jansetu_domain::util::now_ms();
        let token = service.issue(&demo_user(), now_ms).expect("issue");
        let session = service.verify(&token).expect("verify");
        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.role, Role::Manager);
        assert_eq!(session.ulb_id.as_deref(), Some("ulb_adi"));
        assert!(session.permissions.grants("issues.manage"));
        assert!(!session.permissions.grants("users.manage"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new("test-secret", 0);
        // exp == iat with zero ttl; jsonwebtoken's default leeway is 60s, so
        // back-date the issue time well past it.
        let token = service
            .issue(&demo_user(), jansetu_domain::util::now_ms() - 600_000)
            .expect("issue");
        assert!(matches!(
            service.verify(&token),
            Err(TokenError::Decode(_))
        ));
    }

    #[test]
    fn token_with_unknown_role_is_rejected() {
        let service = TokenService::new("test-secret", 3_600);
        let claims = Claims {
            sub: "u-2".to_string(),
            name: "x".to_string(),
            role: "citizen".to_string(),
            perms: vec![],
            ulb: None,
            exp: (jansetu_domain::util::now_ms() / 1_000) as usize + 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .expect("encode");
        assert!(matches!(
            service.verify(&token),
            Err(TokenError::UnknownRole(_))
        ));
    }

    #[test]
    fn digest_is_stable_hex() {
        let digest = password_digest("demo123");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, password_digest("demo123"));
        assert_ne!(digest, password_digest("demo124"));
    }
}
