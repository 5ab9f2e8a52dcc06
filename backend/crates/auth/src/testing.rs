//! In-memory doubles for the repository traits and the mail transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use platform::mail::{MailError, MailMessage, MailTransport};

use crate::domain::entity::{user::User, verification_token::VerificationToken};
use crate::domain::repository::{UserRepository, VerificationTokenRepository};
use crate::domain::value_object::{
    email::Email, token_id::TokenId, user_id::UserId, user_password::UserPassword,
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tokens: Vec<VerificationToken>,
}

#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, email: &str) -> Option<User> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.email.as_str() == email)
            .cloned()
    }

    /// Latest token of the user registered under `email`
    pub fn latest_token(&self, email: &str) -> Option<VerificationToken> {
        let user = self.user(email)?;
        let tables = self.tables.lock().unwrap();
        latest(&tables.tokens, &user.user_id).cloned()
    }

    pub fn token_count(&self) -> usize {
        self.tables.lock().unwrap().tokens.len()
    }

    /// Overwrite the expiry of every token belonging to `email`
    pub fn set_token_expiry(&self, email: &str, expires_at: DateTime<Utc>) {
        let Some(user) = self.user(email) else {
            return;
        };
        let mut tables = self.tables.lock().unwrap();
        for token in tables.tokens.iter_mut().filter(|t| t.user_id == user.user_id) {
            token.expires_at = expires_at;
        }
    }

    /// Move every expiry into the past
    pub fn expire_all_tokens(&self) {
        let mut tables = self.tables.lock().unwrap();
        for token in &mut tables.tokens {
            token.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

fn latest<'a>(tokens: &'a [VerificationToken], user_id: &UserId) -> Option<&'a VerificationToken> {
    tokens
        .iter()
        .filter(|t| &t.user_id == user_id)
        .max_by_key(|t| t.created_at)
}

impl UserRepository for InMemoryAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| &u.user_id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().any(|u| &u.email == email))
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| &u.user_id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        user.set_password(password.clone(), updated_at);
        Ok(())
    }
}

impl VerificationTokenRepository for InMemoryAuthRepository {
    async fn insert_token(&self, token: &VerificationToken) -> AuthResult<()> {
        self.tables.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }

    async fn find_active_token(
        &self,
        user_id: &UserId,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<VerificationToken>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tokens
            .iter()
            .filter(|t| &t.user_id == user_id && &t.code == code && !t.is_expired_at(now))
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn find_latest_token(&self, user_id: &UserId) -> AuthResult<Option<VerificationToken>> {
        let tables = self.tables.lock().unwrap();
        Ok(latest(&tables.tokens, user_id).cloned())
    }

    async fn consume_token(
        &self,
        token: &VerificationToken,
        used_at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut tables = self.tables.lock().unwrap();

        let Some(stored) = tables
            .tokens
            .iter_mut()
            .find(|t| t.token_id == token.token_id && !t.used)
        else {
            return Ok(false);
        };
        stored.consume(used_at);

        if let Some(user) = tables.users.iter_mut().find(|u| u.user_id == token.user_id) {
            user.mark_verified(used_at);
        }
        Ok(true)
    }

    async fn rotate_token(
        &self,
        token_id: &TokenId,
        code: &VerificationCode,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
        max_resends: u16,
    ) -> AuthResult<bool> {
        let mut tables = self.tables.lock().unwrap();

        let Some(stored) = tables
            .tokens
            .iter_mut()
            .find(|t| &t.token_id == token_id && t.can_resend(max_resends))
        else {
            return Ok(false);
        };
        stored.rotate(code.clone(), expires_at, now);
        Ok(true)
    }
}

/// Mail transport that records messages, optionally failing every send
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl MailTransport for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected { status: 503 });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
