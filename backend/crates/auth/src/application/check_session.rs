//! Check Session Use Case
//!
//! Drives one request through the session state machine:
//!
//! ```text
//! Unauthenticated --(credential)--> TokenPresent --(valid)----> Authenticated
//!        |                               |
//!        +--(none / unusable)------------+--(expired/invalid)--> Rejected(reason)
//! ```
//!
//! `Authenticated` and `Rejected` are terminal.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::token_issuer::TokenIssuer;
use crate::domain::entity::session_claims::SessionClaims;
use crate::error::{AuthError, AuthResult};

/// What the request carried as a session credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedCredential {
    None,
    Token(String),
    /// Something was sent but it cannot be a token (e.g. `Basic` auth)
    Unusable,
}

/// Why a session was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Missing,
    Expired,
    Invalid,
}

impl RejectReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Missing => "missing",
            RejectReason::Expired => "expired",
            RejectReason::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    TokenPresent(String),
    Authenticated(SessionClaims),
    Rejected(RejectReason),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Authenticated(_) | SessionState::Rejected(_)
        )
    }

    /// Claims of an authenticated session, or the matching 401 error
    pub fn into_claims(self) -> AuthResult<SessionClaims> {
        match self {
            SessionState::Authenticated(claims) => Ok(claims),
            SessionState::Rejected(RejectReason::Expired) => Err(AuthError::TokenExpired),
            SessionState::Rejected(RejectReason::Invalid) | SessionState::TokenPresent(_) => {
                Err(AuthError::TokenMalformed)
            }
            SessionState::Rejected(RejectReason::Missing) | SessionState::Unauthenticated => {
                Err(AuthError::SessionMissing)
            }
        }
    }
}

/// Check session use case
pub struct CheckSessionUseCase {
    issuer: Arc<TokenIssuer>,
}

impl CheckSessionUseCase {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }

    pub fn execute(&self, credential: PresentedCredential) -> SessionState {
        self.execute_at(credential, Utc::now())
    }

    /// Run the machine until it reaches a terminal state
    pub fn execute_at(&self, credential: PresentedCredential, now: DateTime<Utc>) -> SessionState {
        let mut credential = Some(credential);
        let mut state = SessionState::Unauthenticated;

        while !state.is_terminal() {
            state = match state {
                SessionState::Unauthenticated => match credential.take() {
                    Some(PresentedCredential::Token(token)) => SessionState::TokenPresent(token),
                    Some(PresentedCredential::Unusable) => {
                        SessionState::Rejected(RejectReason::Invalid)
                    }
                    Some(PresentedCredential::None) | None => {
                        SessionState::Rejected(RejectReason::Missing)
                    }
                },
                SessionState::TokenPresent(token) => self.verify(&token, now),
                terminal => terminal,
            };
        }

        state
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> SessionState {
        match self.issuer.verify_at(token, now) {
            Ok(claims) => SessionState::Authenticated(claims),
            Err(AuthError::TokenExpired) => SessionState::Rejected(RejectReason::Expired),
            Err(e) => {
                tracing::debug!(error = %e, "Session token rejected");
                SessionState::Rejected(RejectReason::Invalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::entity::session_claims::TokenSubject;
    use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
    use chrono::Duration;

    fn use_case() -> (CheckSessionUseCase, Arc<TokenIssuer>) {
        let issuer = Arc::new(
            TokenIssuer::new(b"check-session-secret-check-session", &AuthConfig::default())
                .unwrap(),
        );
        (CheckSessionUseCase::new(issuer.clone()), issuer)
    }

    fn token(issuer: &TokenIssuer, now: DateTime<Utc>) -> String {
        let subject = TokenSubject {
            user_id: UserId::new(),
            email: "viewer@estate.test".into(),
            display_name: "Viewer".into(),
            role: Some(UserRole::User),
        };
        issuer.issue_at(&subject, now).unwrap().token
    }

    #[test]
    fn test_no_credential_is_missing() {
        let (use_case, _) = use_case();
        assert_eq!(
            use_case.execute(PresentedCredential::None),
            SessionState::Rejected(RejectReason::Missing)
        );
    }

    #[test]
    fn test_unusable_credential_is_invalid() {
        let (use_case, _) = use_case();
        assert_eq!(
            use_case.execute(PresentedCredential::Unusable),
            SessionState::Rejected(RejectReason::Invalid)
        );
    }

    #[test]
    fn test_valid_token_authenticates() {
        let (use_case, issuer) = use_case();
        let now = Utc::now();
        let state = use_case.execute_at(PresentedCredential::Token(token(&issuer, now)), now);

        let SessionState::Authenticated(claims) = state else {
            panic!("expected authenticated, got {state:?}");
        };
        assert_eq!(claims.email, "viewer@estate.test");
    }

    #[test]
    fn test_expired_and_invalid_are_distinct() {
        let (use_case, issuer) = use_case();
        let now = Utc::now();

        let expired = use_case.execute_at(
            PresentedCredential::Token(token(&issuer, now)),
            now + Duration::hours(25),
        );
        assert_eq!(expired, SessionState::Rejected(RejectReason::Expired));

        let invalid = use_case.execute_at(PresentedCredential::Token("a.b.c".into()), now);
        assert_eq!(invalid, SessionState::Rejected(RejectReason::Invalid));
    }

    #[test]
    fn test_into_claims_maps_reasons() {
        assert!(matches!(
            SessionState::Rejected(RejectReason::Missing).into_claims(),
            Err(AuthError::SessionMissing)
        ));
        assert!(matches!(
            SessionState::Rejected(RejectReason::Expired).into_claims(),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            SessionState::Rejected(RejectReason::Invalid).into_claims(),
            Err(AuthError::TokenMalformed)
        ));
    }
}
