//! User Entity
//!
//! The identity record: login email, display name, password hash and role.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    display_name::DisplayName, email::Email, user_id::UserId, user_password::UserPassword,
    user_role::UserRole,
};

/// User entity
///
/// `Debug` is safe to log; the password prints as `[HASH]`.
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Login identifier (unique, lowercased)
    pub email: Email,
    /// Shown in the UI and carried in the session token
    pub display_name: DisplayName,
    /// Argon2id hash
    pub password: UserPassword,
    /// Role (User, Admin)
    pub user_role: UserRole,
    /// Set once a verification code has been redeemed
    pub email_verified: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(
        email: Email,
        display_name: DisplayName,
        password: UserPassword,
        user_role: UserRole,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            display_name,
            password,
            user_role,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_role.is_admin()
    }

    /// Replace the password hash
    pub fn set_password(&mut self, password: UserPassword, at: DateTime<Utc>) {
        self.password = password;
        self.updated_at = at;
    }

    pub fn mark_verified(&mut self, at: DateTime<Utc>) {
        self.email_verified = true;
        self.updated_at = at;
    }
}
