//! Token plumbing and the request auth context.
//!
//! Access and refresh tokens are HS256 JWTs signed with separate secrets.
//! Handlers never touch tokens directly: the `CurrentUser` extractor resolves
//! the bearer credential to a loaded user with its role set, and everything
//! downstream works against that context.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tenderd_core::models::{Role, User};
use tenderd_core::{AppError, Config};

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User email.
    pub sub: String,
    pub username: String,
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_hours: i64,
    refresh_ttl_days: i64,
}

impl AuthKeys {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
            access_ttl_hours: config.access_token_ttl_hours,
            refresh_ttl_days: config.refresh_token_ttl_days,
        }
    }

    /// Issue a fresh access + refresh pair for the user.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = Utc::now().timestamp();

        let access = AccessClaims {
            sub: user.email.clone(),
            username: user.username.clone(),
            roles: user.roles.clone(),
            iat: now,
            exp: now + self.access_ttl_hours * 3600,
        };
        let refresh = RefreshClaims {
            sub: user.email.clone(),
            iat: now,
            exp: now + self.refresh_ttl_days * 24 * 3600,
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access, &self.access_encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;
        let refresh_token = encode(&header, &refresh, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid or expired access token".to_string()))
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(
            token,
            &self.refresh_decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_string()))
    }

    /// Rotation requires the old access token to be signature-valid but
    /// already expired; a still-live access token must not be refreshable.
    pub fn verify_expired_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<AccessClaims>(token, &self.access_decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Invalid access token".to_string()))?;

        if claims.exp > Utc::now().timestamp() {
            return Err(AppError::Unauthorized(
                "Access token is not expired yet".to_string(),
            ));
        }
        Ok(claims)
    }
}

/// Authenticated request context: the caller resolved to a stored user.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                HttpError(AppError::Unauthorized("Missing bearer token".to_string()))
            })?;
        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            HttpError(AppError::Unauthorized("Missing bearer token".to_string()))
        })?;

        let claims = state.auth.verify_access(token)?;
        let user = state
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| {
                HttpError(AppError::Unauthorized("Unknown token subject".to_string()))
            })?;

        Ok(CurrentUser(user))
    }
}

/// Admin gate used by every `/admin` handler.
pub fn require_admin(user: &User) -> Result<(), HttpError> {
    if user.has_role(Role::Admin) {
        Ok(())
    } else {
        Err(HttpError(AppError::AccessDenied(
            "Admin role required".to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenderd_core::models::UserStatus;

    fn keys() -> AuthKeys {
        AuthKeys {
            access_encoding: EncodingKey::from_secret(b"access-secret"),
            access_decoding: DecodingKey::from_secret(b"access-secret"),
            refresh_encoding: EncodingKey::from_secret(b"refresh-secret"),
            refresh_decoding: DecodingKey::from_secret(b"refresh-secret"),
            access_ttl_hours: 24,
            refresh_ttl_days: 30,
        }
    }

    fn user() -> User {
        User {
            id: 1,
            name: "Ann".to_string(),
            surname: "Smith".to_string(),
            email: "ann@example.com".to_string(),
            username: "ann".to_string(),
            password_hash: String::new(),
            created_at: chrono::NaiveDateTime::default(),
            status: Some(UserStatus::Active),
            roles: vec![Role::User, Role::Supplier],
        }
    }

    #[test]
    fn issued_access_token_verifies_and_carries_roles() {
        let keys = keys();
        let pair = keys.issue_pair(&user()).unwrap();

        let claims = keys.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "ann@example.com");
        assert_eq!(claims.roles, vec![Role::User, Role::Supplier]);

        let refresh = keys.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, "ann@example.com");
    }

    #[test]
    fn access_and_refresh_secrets_are_not_interchangeable() {
        let keys = keys();
        let pair = keys.issue_pair(&user()).unwrap();
        assert!(keys.verify_refresh(&pair.access_token).is_err());
        assert!(keys.verify_access(&pair.refresh_token).is_err());
    }

    #[test]
    fn live_access_token_cannot_be_used_for_rotation() {
        let keys = keys();
        let pair = keys.issue_pair(&user()).unwrap();
        assert!(keys.verify_expired_access(&pair.access_token).is_err());
    }

    #[test]
    fn garbage_tokens_are_unauthorized() {
        let keys = keys();
        assert!(keys.verify_access("not-a-token").is_err());
        assert!(keys.verify_expired_access("not-a-token").is_err());
    }
}
