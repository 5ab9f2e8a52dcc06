//! Application Configuration
//!
//! Configuration for the Auth application layer. The JWT signing secret is
//! not part of it; it goes straight into [`TokenIssuer`](super::token_issuer::TokenIssuer).

use std::time::Duration;

use platform::cookie::CookieConfig;

use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// `iss` claim written and required on session tokens
    pub token_issuer: String,
    /// Session token lifetime (24 hours)
    pub token_ttl: Duration,
    /// Verification code lifetime (48 hours)
    pub verification_code_ttl: Duration,
    /// Rotations allowed per verification token
    pub max_verification_resends: u16,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "session_token".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            token_issuer: "estate-backend".to_string(),
            token_ttl: Duration::from_secs(24 * 3600),             // 24 hours
            verification_code_ttl: Duration::from_secs(48 * 3600), // 48 hours
            max_verification_resends: 3,
        }
    }
}

impl AuthConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    /// Cookie attributes for the session cookie
    pub fn cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
        }
    }

    pub fn token_ttl_delta(&self) -> AuthResult<chrono::Duration> {
        chrono::Duration::from_std(self.token_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid token TTL: {e}")))
    }

    pub fn verification_code_ttl_delta(&self) -> AuthResult<chrono::Duration> {
        chrono::Duration::from_std(self.verification_code_ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid verification code TTL: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.token_ttl_delta().unwrap(), chrono::Duration::hours(24));
        assert_eq!(
            config.verification_code_ttl_delta().unwrap(),
            chrono::Duration::hours(48)
        );
        assert_eq!(config.max_verification_resends, 3);
        assert!(config.cookie().secure);
        assert!(!AuthConfig::development().cookie().secure);
    }
}
