//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    user::User,
    verification_token::{VerificationReason, VerificationToken},
};
use crate::domain::repository::{UserRepository, VerificationTokenRepository};
use crate::domain::value_object::{
    display_name::DisplayName, email::Email, token_id::TokenId, user_id::UserId,
    user_password::UserPassword, user_role::UserRole, verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violation on `users.email` means the address is taken
fn map_insert_error(err: sqlx::Error) -> AuthError {
    let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        AuthError::EmailTaken
    } else {
        AuthError::Database(err)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_user(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                display_name,
                password_hash,
                user_role,
                email_verified,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.display_name.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.user_role.id())
        .bind(user.email_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                display_name,
                password_hash,
                user_role,
                email_verified,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                display_name,
                password_hash,
                user_role,
                email_verified,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(password.as_phc_string())
        .bind(updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}

// ============================================================================
// Verification Token Repository Implementation
// ============================================================================

impl VerificationTokenRepository for PgAuthRepository {
    async fn insert_token(&self, token: &VerificationToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens (
                token_id,
                user_id,
                code,
                reason,
                used,
                used_at,
                resend_count,
                created_at,
                updated_at,
                expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(token.token_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(token.code.as_str())
        .bind(token.reason.code())
        .bind(token.used)
        .bind(token.used_at)
        .bind(token.resend_count as i16)
        .bind(token.created_at)
        .bind(token.updated_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active_token(
        &self,
        user_id: &UserId,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationTokenRow>(
            r#"
            SELECT
                token_id,
                user_id,
                code,
                reason,
                used,
                used_at,
                resend_count,
                created_at,
                updated_at,
                expires_at
            FROM verification_tokens
            WHERE user_id = $1
              AND code = $2
              AND expires_at > $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(code.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_token()).transpose()
    }

    async fn find_latest_token(&self, user_id: &UserId) -> AuthResult<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationTokenRow>(
            r#"
            SELECT
                token_id,
                user_id,
                code,
                reason,
                used,
                used_at,
                resend_count,
                created_at,
                updated_at,
                expires_at
            FROM verification_tokens
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_token()).transpose()
    }

    async fn consume_token(
        &self,
        token: &VerificationToken,
        used_at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the token serializes concurrent redemptions
        let consumed = sqlx::query(
            r#"
            UPDATE verification_tokens SET
                used = TRUE,
                used_at = $2,
                updated_at = $2
            WHERE token_id = $1
              AND used = FALSE
            "#,
        )
        .bind(token.token_id.as_uuid())
        .bind(used_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if consumed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE users SET
                email_verified = TRUE,
                updated_at = $2
            WHERE user_id = $1
            "#,
        )
        .bind(token.user_id.as_uuid())
        .bind(used_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

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
        let rotated = sqlx::query(
            r#"
            UPDATE verification_tokens SET
                code = $2,
                expires_at = $3,
                updated_at = $4,
                resend_count = resend_count + 1
            WHERE token_id = $1
              AND resend_count < $5
            "#,
        )
        .bind(token_id.as_uuid())
        .bind(code.as_str())
        .bind(expires_at)
        .bind(now)
        .bind(max_resends as i16)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rotated == 1)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    display_name: String,
    password_hash: String,
    user_role: i16,
    email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let user_role = UserRole::from_id(self.user_role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", self.user_role)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            display_name: DisplayName::from_db(self.display_name),
            password: UserPassword::from_phc_string(self.password_hash)?,
            user_role,
            email_verified: self.email_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VerificationTokenRow {
    token_id: Uuid,
    user_id: Uuid,
    code: String,
    reason: String,
    used: bool,
    used_at: Option<DateTime<Utc>>,
    resend_count: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl VerificationTokenRow {
    fn into_token(self) -> AuthResult<VerificationToken> {
        let reason = VerificationReason::from_code(&self.reason)
            .ok_or_else(|| AuthError::Internal(format!("Invalid token reason: {}", self.reason)))?;

        let resend_count = u16::try_from(self.resend_count).map_err(|_| {
            AuthError::Internal(format!("Invalid resend_count: {}", self.resend_count))
        })?;

        Ok(VerificationToken {
            token_id: TokenId::from_uuid(self.token_id),
            user_id: UserId::from_uuid(self.user_id),
            code: VerificationCode::from_db(self.code),
            reason,
            used: self.used,
            used_at: self.used_at,
            resend_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
        })
    }
}
