//! Token Issuer
//!
//! Mints and verifies HS256 session tokens.
//!
//! - 署名アルゴリズムは HS256 固定。ヘッダが他を名乗れば `UnsupportedAlgorithm`
//! - 有効期限は発行から 24 時間。`exp` ちょうどの時刻で失効扱い
//! - email / role / 表示名のいずれかが欠けた主体には発行しない (`MissingClaim`)

use chrono::{DateTime, Utc};
use platform::jwt::JwtCodec;

use crate::application::config::AuthConfig;
use crate::domain::entity::session_claims::{SessionClaims, TokenSubject};
use crate::error::{AuthError, AuthResult};

/// A freshly signed token and the claims inside it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

impl IssuedToken {
    /// Seconds until expiry, for cookie `Max-Age`
    pub fn max_age_secs(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

pub struct TokenIssuer {
    codec: JwtCodec,
    issuer: String,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    /// Build from the signing secret. The secret is only borrowed.
    pub fn new(secret: &[u8], config: &AuthConfig) -> AuthResult<Self> {
        let codec = JwtCodec::new(secret, &config.token_issuer)?;

        Ok(Self {
            codec,
            issuer: config.token_issuer.clone(),
            ttl: config.token_ttl_delta()?,
        })
    }

    pub fn issue(&self, subject: &TokenSubject) -> AuthResult<IssuedToken> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &TokenSubject, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        if subject.email.trim().is_empty() {
            return Err(AuthError::MissingClaim("email"));
        }
        let Some(role) = subject.role else {
            return Err(AuthError::MissingClaim("role"));
        };
        if subject.display_name.trim().is_empty() {
            return Err(AuthError::MissingClaim("username"));
        }

        let iat = now.timestamp();
        let claims = SessionClaims {
            sub: subject.user_id,
            email: subject.email.clone(),
            role,
            username: subject.display_name.clone(),
            iss: self.issuer.clone(),
            iat,
            nbf: iat,
            exp: iat + self.ttl.num_seconds(),
        };

        let token = self.codec.encode(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        self.verify_at(token, Utc::now())
    }

    /// Signature and algorithm first; an expired token with a bad
    /// signature is `TokenMalformed`, not `TokenExpired`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<SessionClaims> {
        let claims: SessionClaims = self.codec.decode(token)?;
        let now = now.timestamp();

        if claims.exp <= claims.iat || now < claims.nbf {
            return Err(AuthError::TokenMalformed);
        }

        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
    use chrono::Duration;

    const SECRET: &[u8] = b"unit-test-secret-unit-test-secret";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, &AuthConfig::default()).unwrap()
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: UserId::new(),
            email: "agent@estate.test".into(),
            display_name: "Agent Smith".into(),
            role: Some(UserRole::Admin),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let now = Utc::now();
        let subject = subject();
        let issued = issuer().issue_at(&subject, now).unwrap();

        let claims = issuer().verify_at(&issued.token, now).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, subject.user_id);
        assert_eq!(claims.email, "agent@estate.test");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.username, "Agent Smith");
        assert_eq!(claims.iss, "estate-backend");
        assert_eq!(issued.max_age_secs(), 24 * 3600);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let issued = issuer().issue_at(&subject(), now).unwrap();

        let just_before = now + Duration::hours(24) - Duration::seconds(1);
        assert!(issuer().verify_at(&issued.token, just_before).is_ok());

        let at_expiry = now + Duration::hours(24);
        assert!(matches!(
            issuer().verify_at(&issued.token, at_expiry),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_missing_claims() {
        let mut no_email = subject();
        no_email.email = "  ".into();
        assert!(matches!(
            issuer().issue(&no_email),
            Err(AuthError::MissingClaim("email"))
        ));

        let mut no_role = subject();
        no_role.role = None;
        assert!(matches!(
            issuer().issue(&no_role),
            Err(AuthError::MissingClaim("role"))
        ));

        let mut no_name = subject();
        no_name.display_name = String::new();
        assert!(matches!(
            issuer().issue(&no_name),
            Err(AuthError::MissingClaim("username"))
        ));
    }

    #[test]
    fn test_foreign_secret_is_malformed() {
        let other = TokenIssuer::new(b"another-secret-another-secret-xx", &AuthConfig::default())
            .unwrap();
        let issued = other.issue(&subject()).unwrap();
        assert!(matches!(
            issuer().verify(&issued.token),
            Err(AuthError::TokenMalformed)
        ));
    }

    #[test]
    fn test_expired_forgery_is_malformed() {
        let now = Utc::now();
        let issued = issuer().issue_at(&subject(), now).unwrap();
        let tampered = format!("{}x", issued.token);
        assert!(matches!(
            issuer().verify_at(&tampered, now + Duration::days(3)),
            Err(AuthError::TokenMalformed)
        ));
    }

    #[test]
    fn test_token_from_the_future_is_malformed() {
        let now = Utc::now();
        let issued = issuer().issue_at(&subject(), now + Duration::hours(1)).unwrap();
        assert!(matches!(
            issuer().verify_at(&issued.token, now),
            Err(AuthError::TokenMalformed)
        ));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            TokenIssuer::new(b"", &AuthConfig::default()),
            Err(AuthError::Internal(_))
        ));
    }
}
