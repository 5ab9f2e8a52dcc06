//! Sign Up Use Case
//!
//! Creates a new, unverified user account. Sending the verification code is
//! the caller's next step (see [`EmailVerificationUseCase::spawn_send`]).
//!
//! [`EmailVerificationUseCase::spawn_send`]: super::email_verification::EmailVerificationUseCase::spawn_send

use std::sync::Arc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Sign up use case
pub struct SignUpUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> SignUpUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<User> {
        let email = Email::new(input.email)?;
        let display_name = DisplayName::new(input.display_name)?;

        let raw_password = RawPassword::new(input.password)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password = UserPassword::from_raw(&raw_password)?;
        let user = User::new(email, display_name, password, input.role);

        // The unique constraint still catches a concurrent signup
        self.user_repo.create_user(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            role = %user.user_role,
            "User signed up"
        );

        Ok(user)
    }
}
