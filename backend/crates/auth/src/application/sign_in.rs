//! Sign In Use Case
//!
//! Checks email and password, then issues a session token.

use std::sync::Arc;

use crate::application::token_issuer::{IssuedToken, TokenIssuer};
use crate::domain::entity::{session_claims::TokenSubject, user::User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
pub struct SignInOutput {
    pub user: User,
    pub token: IssuedToken,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    issuer: Arc<TokenIssuer>,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, issuer: Arc<TokenIssuer>) -> Self {
        Self { user_repo, issuer }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and password are required".into(),
            ));
        }

        // Unknown email, malformed email and wrong password look the same
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let candidate = RawPassword::candidate(input.password);

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.password.verify(&candidate) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(&TokenSubject::from(&user))?;

        tracing::info!(user_id = %user.user_id, "User signed in");

        Ok(SignInOutput { user, token })
    }
}
