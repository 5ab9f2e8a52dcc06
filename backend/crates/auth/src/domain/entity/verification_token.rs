//! Verification Token Entity
//!
//! One row per issued email-verification code. A resend rewrites the code
//! and expiry of the latest row in place, so `resend_count` bounds how many
//! codes a single row ever produces.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::domain::value_object::{
    token_id::TokenId, user_id::UserId, verification_code::VerificationCode,
};

/// Why a code was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationReason {
    /// Sent right after signup
    Registration,
    /// Explicitly requested again by the user
    Resend,
}

impl VerificationReason {
    pub const fn code(&self) -> &'static str {
        match self {
            VerificationReason::Registration => "registration",
            VerificationReason::Resend => "resend",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "registration" => Some(VerificationReason::Registration),
            "resend" => Some(VerificationReason::Resend),
            _ => None,
        }
    }
}

impl fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub token_id: TokenId,
    pub user_id: UserId,
    pub code: VerificationCode,
    pub reason: VerificationReason,
    /// Flips to true exactly once
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    /// Rotations performed on this row
    pub resend_count: u16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Issue a fresh code valid for `ttl` from `now`
    pub fn issue(
        user_id: UserId,
        code: VerificationCode,
        reason: VerificationReason,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token_id: TokenId::new(),
            user_id,
            code,
            reason,
            used: false,
            used_at: None,
            resend_count: 0,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
        }
    }

    /// Expired at the exact expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn can_resend(&self, max_resends: u16) -> bool {
        self.resend_count < max_resends
    }

    /// Replace the code on this row and push the expiry out
    pub fn rotate(&mut self, code: VerificationCode, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.code = code;
        self.expires_at = expires_at;
        self.resend_count += 1;
        self.updated_at = now;
    }

    pub fn consume(&mut self, now: DateTime<Utc>) {
        self.used = true;
        self.used_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(now: DateTime<Utc>) -> VerificationToken {
        VerificationToken::issue(
            UserId::new(),
            VerificationCode::from_db("123456"),
            VerificationReason::Registration,
            Duration::hours(48),
            now,
        )
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let token = token(now);
        assert!(!token.is_expired_at(now + Duration::hours(48) - Duration::seconds(1)));
        assert!(token.is_expired_at(now + Duration::hours(48)));
    }

    #[test]
    fn test_rotate_keeps_row() {
        let now = Utc::now();
        let mut token = token(now);
        let id = token.token_id;
        let later = now + Duration::hours(1);

        token.rotate(VerificationCode::from_db("654321"), later + Duration::hours(48), later);

        assert_eq!(token.token_id, id);
        assert_eq!(token.code.as_str(), "654321");
        assert_eq!(token.resend_count, 1);
        assert_eq!(token.expires_at, later + Duration::hours(48));
        assert!(token.can_resend(3));
    }

    #[test]
    fn test_resend_cap() {
        let mut token = token(Utc::now());
        token.resend_count = 3;
        assert!(!token.can_resend(3));
    }

    #[test]
    fn test_reason_codes() {
        for reason in [VerificationReason::Registration, VerificationReason::Resend] {
            assert_eq!(VerificationReason::from_code(reason.code()), Some(reason));
        }
        assert_eq!(VerificationReason::from_code("other"), None);
    }
}
