//! Email Verification Use Case
//!
//! Issues, redeems and rotates six-digit verification codes.
//!
//! - A code lives 48 hours and can be redeemed once
//! - Redeeming marks the token used and the user verified in one transaction
//! - A resend rewrites the latest token in place, at most 3 times

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::mail::{MailMessage, MailTransport};
use tokio::task::JoinHandle;

use crate::application::config::AuthConfig;
use crate::domain::entity::{
    user::User,
    verification_token::{VerificationReason, VerificationToken},
};
use crate::domain::repository::{UserRepository, VerificationTokenRepository};
use crate::domain::value_object::{email::Email, verification_code::VerificationCode};
use crate::error::{AuthError, AuthResult};

const SUBJECT: &str = "Verify your email address";

pub struct EmailVerificationUseCase<U, T, M>
where
    U: UserRepository,
    T: VerificationTokenRepository,
    M: MailTransport,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, T, M> Clone for EmailVerificationUseCase<U, T, M>
where
    U: UserRepository,
    T: VerificationTokenRepository,
    M: MailTransport,
{
    fn clone(&self) -> Self {
        Self {
            user_repo: self.user_repo.clone(),
            token_repo: self.token_repo.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
        }
    }
}

impl<U, T, M> EmailVerificationUseCase<U, T, M>
where
    U: UserRepository,
    T: VerificationTokenRepository,
    M: MailTransport,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    /// Issue a new code for the user behind `email` and mail it.
    ///
    /// The token row is persisted before dispatch and kept if delivery
    /// fails, so a later resend can recover.
    pub async fn send_verification(
        &self,
        email: &Email,
        reason: VerificationReason,
    ) -> AuthResult<()> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.issue_and_send(&user, reason).await
    }

    /// Redeem a code.
    pub async fn verify(&self, email: &str, code: &str) -> AuthResult<()> {
        if email.trim().is_empty() || code.trim().is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and verification code are required".into(),
            ));
        }

        let email = Email::new(email)?;
        let code = VerificationCode::parse(code)?;
        let now = Utc::now();

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCode);
        };

        let token = self
            .token_repo
            .find_active_token(&user.user_id, &code, now)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        if token.used {
            return Err(AuthError::CodeAlreadyUsed);
        }

        // Lost a race with a concurrent redemption
        if !self.token_repo.consume_token(&token, now).await? {
            return Err(AuthError::CodeAlreadyUsed);
        }

        tracing::info!(user_id = %user.user_id, "Email verified");
        Ok(())
    }

    /// Rotate the latest code and mail the new one.
    pub async fn resend(&self, email: &str) -> AuthResult<()> {
        if email.trim().is_empty() {
            return Err(AuthError::InvalidInput("Email is required".into()));
        }

        let email = Email::new(email)?;
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let max_resends = self.config.max_verification_resends;
        let Some(token) = self.token_repo.find_latest_token(&user.user_id).await? else {
            return self
                .issue_and_send(&user, VerificationReason::Resend)
                .await;
        };

        if !token.can_resend(max_resends) {
            return Err(AuthError::ResendLimitExceeded);
        }

        let code = VerificationCode::generate();
        let now = Utc::now();
        let expires_at = now + self.config.verification_code_ttl_delta()?;

        // The stored code and counter only change once the mail is accepted
        self.dispatch(&user, &code, expires_at).await?;

        // Conditional on the counter, so concurrent resends cannot overshoot
        let rotated = self
            .token_repo
            .rotate_token(&token.token_id, &code, expires_at, now, max_resends)
            .await?;
        if !rotated {
            tracing::warn!(user_id = %user.user_id, "Resend lost a race with a concurrent resend");
            return Err(AuthError::ResendLimitExceeded);
        }

        tracing::info!(
            user_id = %user.user_id,
            resend_count = token.resend_count + 1,
            "Verification code resent"
        );
        Ok(())
    }

    async fn issue_and_send(&self, user: &User, reason: VerificationReason) -> AuthResult<()> {
        let now = Utc::now();
        let token = VerificationToken::issue(
            user.user_id,
            VerificationCode::generate(),
            reason,
            self.config.verification_code_ttl_delta()?,
            now,
        );

        self.token_repo.insert_token(&token).await?;
        self.dispatch(user, &token.code, token.expires_at).await?;

        tracing::info!(user_id = %user.user_id, reason = %reason, "Verification code sent");
        Ok(())
    }

    async fn dispatch(
        &self,
        user: &User,
        code: &VerificationCode,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let message = MailMessage {
            to: user.email.as_str().to_string(),
            subject: SUBJECT.to_string(),
            html_body: render_body(code, expires_at),
        };

        self.mailer.send(&message).await?;
        Ok(())
    }
}

impl<U, T, M> EmailVerificationUseCase<U, T, M>
where
    U: UserRepository + Send + Sync + 'static,
    T: VerificationTokenRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    /// Send in a detached task. The outcome is logged, never retried.
    pub fn spawn_send(&self, email: Email, reason: VerificationReason) -> JoinHandle<()> {
        let use_case = self.clone();

        tokio::spawn(async move {
            if let Err(e) = use_case.send_verification(&email, reason).await {
                tracing::error!(error = %e, reason = %reason, "Background verification email failed");
            }
        })
    }
}

fn render_body(code: &VerificationCode, expires_at: DateTime<Utc>) -> String {
    format!(
        "<p>Use the code below to verify your email address.</p>\
         <p style=\"font-size:24px;letter-spacing:4px\"><strong>{}</strong></p>\
         <p>The code expires at {} (UTC). If you did not sign up, ignore this message.</p>",
        code.as_str(),
        expires_at.format("%Y-%m-%d %H:%M"),
    )
}
