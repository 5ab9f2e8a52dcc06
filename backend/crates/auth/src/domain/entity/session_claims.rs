//! Session Claims
//!
//! Payload of the signed session token, and the identity it is minted from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::{user_id::UserId, user_role::UserRole};

/// Claims carried by a session token.
///
/// Inserted into request extensions once the session middleware accepts
/// the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: UserId,
    pub email: String,
    pub role: UserRole,
    /// Display name
    pub username: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Identity to issue a token for.
///
/// The issuer rejects a subject with a blank field or no role.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Option<UserRole>,
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.as_str().to_string(),
            display_name: user.display_name.as_str().to_string(),
            role: Some(user.user_role),
        }
    }
}
