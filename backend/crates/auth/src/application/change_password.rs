//! Change Password Use Case

use std::sync::Arc;

use chrono::Utc;

use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Replace the password after re-checking the current one.
    ///
    /// Sessions already issued stay valid until they expire.
    pub async fn execute(&self, user_id: &UserId, input: ChangePasswordInput) -> AuthResult<()> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let current = RawPassword::candidate(input.current_password);
        if !user.password.verify(&current) {
            return Err(AuthError::InvalidCredentials);
        }

        let new_password = RawPassword::new(input.new_password)?;
        let hashed = UserPassword::from_raw(&new_password)?;

        self.user_repo
            .update_password(user_id, &hashed, Utc::now())
            .await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
