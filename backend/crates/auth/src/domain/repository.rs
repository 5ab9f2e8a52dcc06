//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{user::User, verification_token::VerificationToken};
use crate::domain::value_object::{
    email::Email, token_id::TokenId, user_id::UserId, user_password::UserPassword,
    verification_code::VerificationCode,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user. A duplicate email fails with `EmailTaken`.
    async fn create_user(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by (normalized) email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Replace the password hash. Unknown user fails with `UserNotFound`.
    async fn update_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()>;
}

/// Verification token repository trait
#[trait_variant::make(VerificationTokenRepository: Send)]
pub trait LocalVerificationTokenRepository {
    /// Persist a newly issued token
    async fn insert_token(&self, token: &VerificationToken) -> AuthResult<()>;

    /// Most recent token for this user and code that has not expired at
    /// `now`. Used tokens are returned too.
    async fn find_active_token(
        &self,
        user_id: &UserId,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<VerificationToken>>;

    /// Most recent token for this user, in any state
    async fn find_latest_token(&self, user_id: &UserId) -> AuthResult<Option<VerificationToken>>;

    /// Mark the token used and the owner verified, atomically.
    ///
    /// Returns `false` and changes nothing when the token was already used.
    async fn consume_token(
        &self,
        token: &VerificationToken,
        used_at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// Rewrite the code and expiry of a token in place, incrementing its
    /// resend counter.
    ///
    /// Returns `false` when the counter has already reached `max_resends`.
    async fn rotate_token(
        &self,
        token_id: &TokenId,
        code: &VerificationCode,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
        max_resends: u16,
    ) -> AuthResult<bool>;
}
