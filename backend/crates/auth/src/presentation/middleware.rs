//! Auth Middleware
//!
//! - [`require_session`]: 401 unless the request carries a valid session
//!   token; on success the claims go into request extensions as
//!   [`CurrentUser`]. The session cookie is tried first; when it is rejected
//!   a `Bearer` token in `Authorization` gets its own chance, and the
//!   rejection reported is the one of the last credential tried.
//! - [`require_admin`]: 403 unless those claims carry the admin role.
//!   Must run after `require_session`.

use axum::extract::State;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::{Authorization, extract_bearer, extract_cookie};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CheckSessionUseCase, PresentedCredential, RejectReason, SessionState, TokenIssuer,
};
use crate::domain::entity::session_claims::SessionClaims;
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub issuer: Arc<TokenIssuer>,
    pub config: Arc<AuthConfig>,
}

/// Claims of the authenticated caller, stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

/// Credentials in the order they are tried: session cookie, then
/// `Authorization`. Never empty.
pub fn presented_credentials(headers: &HeaderMap, cookie_name: &str) -> Vec<PresentedCredential> {
    let mut credentials = Vec::with_capacity(2);

    if let Some(token) = extract_cookie(headers, cookie_name) {
        credentials.push(PresentedCredential::Token(token));
    }

    match extract_bearer(headers) {
        Authorization::Bearer(token) => credentials.push(PresentedCredential::Token(token)),
        Authorization::Unsupported => credentials.push(PresentedCredential::Unusable),
        Authorization::Absent if credentials.is_empty() => {
            credentials.push(PresentedCredential::None)
        }
        Authorization::Absent => {}
    }

    credentials
}

/// First accepted credential wins; otherwise the last rejection stands
pub fn check_credentials(
    use_case: &CheckSessionUseCase,
    credentials: Vec<PresentedCredential>,
) -> SessionState {
    let mut state = SessionState::Rejected(RejectReason::Missing);

    for credential in credentials {
        state = use_case.execute(credential);
        if matches!(state, SessionState::Authenticated(_)) {
            break;
        }
    }

    state
}

/// Middleware that requires a valid session token
pub async fn require_session(
    State(state): State<AuthMiddlewareState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let credentials = presented_credentials(req.headers(), &state.config.session_cookie_name);
    let use_case = CheckSessionUseCase::new(state.issuer.clone());

    let claims = check_credentials(&use_case, credentials).into_claims()?;

    tracing::debug!(user_id = %claims.sub, role = %claims.role, "Session accepted");

    req.extensions_mut().insert(CurrentUser(claims));
    Ok(next.run(req).await)
}

/// Middleware that requires the admin role
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let is_admin = match req.extensions().get::<CurrentUser>() {
        Some(CurrentUser(claims)) => claims.is_admin(),
        None => return Err(AuthError::SessionMissing),
    };

    if !is_admin {
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}
