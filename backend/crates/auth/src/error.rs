//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Server-side failures are logged in full and answered with a generic
//! message; nothing from a database error or a signing failure reaches
//! the response body.

use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::jwt::JwtError;
use platform::mail::MailError;
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Response header naming why a session was rejected
pub const AUTH_REASON_HEADER: HeaderName = HeaderName::from_static("x-auth-reason");

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Required field missing or malformed
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// Unknown email or wrong password, deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session token on the request
    #[error("Authentication required")]
    SessionMissing,

    /// Session token past its expiry
    #[error("Session has expired")]
    TokenExpired,

    /// Bad signature, bad structure, wrong issuer
    #[error("Session token is invalid")]
    TokenMalformed,

    /// Token signed with something other than HS256
    /// The header value is kept for logging only.
    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm(String),

    /// Authenticated but lacking the required role
    #[error("Insufficient permissions")]
    Forbidden,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Email address already registered
    #[error("Email address is already registered")]
    EmailTaken,

    /// Verification code unknown, expired, or for another user
    #[error("Invalid or expired verification code")]
    InvalidCode,

    /// Verification code was already redeemed
    #[error("Verification code has already been used")]
    CodeAlreadyUsed,

    /// Nothing left to verify
    #[error("Email address is already verified")]
    AlreadyVerified,

    /// Resend cap reached for the current code
    #[error("Verification code resend limit reached")]
    ResendLimitExceeded,

    /// Identity passed to the token issuer lacks a claim
    #[error("Identity is missing the `{0}` claim")]
    MissingClaim(&'static str),

    /// Mail transport failure
    #[error("Mail delivery failed: {0}")]
    Delivery(#[from] MailError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidInput(_) | AuthError::InvalidCode => ErrorKind::BadRequest,
            AuthError::InvalidCredentials
            | AuthError::SessionMissing
            | AuthError::TokenExpired
            | AuthError::TokenMalformed
            | AuthError::UnsupportedAlgorithm(_) => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken | AuthError::CodeAlreadyUsed | AuthError::AlreadyVerified => {
                ErrorKind::Conflict
            }
            AuthError::ResendLimitExceeded => ErrorKind::TooManyRequests,
            AuthError::Delivery(_) => ErrorKind::BadGateway,
            AuthError::MissingClaim(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Session rejection reason, for the 401 family only
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            AuthError::SessionMissing => Some("missing"),
            AuthError::TokenExpired => Some("expired"),
            AuthError::TokenMalformed | AuthError::UnsupportedAlgorithm(_) => Some("invalid"),
            _ => None,
        }
    }

    /// Machine-readable code carried in the problem body
    pub fn code(&self) -> &'static str {
        if let Some(reason) = self.reason() {
            return reason;
        }

        match self {
            AuthError::InvalidInput(_) => "invalid_request",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Forbidden => "forbidden",
            AuthError::UserNotFound => "user_not_found",
            AuthError::EmailTaken => "email_taken",
            AuthError::InvalidCode => "invalid_code",
            AuthError::CodeAlreadyUsed => "code_already_used",
            AuthError::AlreadyVerified => "already_verified",
            AuthError::ResendLimitExceeded => "resend_limit_exceeded",
            AuthError::Delivery(_) => "delivery_failed",
            _ => "internal",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let error = match self {
            AuthError::Delivery(_) => AppError::bad_gateway("Email could not be delivered")
                .with_action("Please try again later"),
            _ if self.kind().is_server_error() => AppError::internal("Internal server error"),
            AuthError::TokenExpired => {
                AppError::new(self.kind(), self.to_string()).with_action("Please sign in again")
            }
            AuthError::InvalidCode => AppError::new(self.kind(), self.to_string())
                .with_action("Request a new verification code"),
            _ => AppError::new(self.kind(), self.to_string()),
        };

        error.with_code(self.code())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::MissingClaim(claim) => {
                tracing::error!(claim, "Token issued for incomplete identity");
            }
            AuthError::Delivery(e) => {
                tracing::error!(error = %e, "Verification email delivery failed");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::UnsupportedAlgorithm(alg) => {
                tracing::warn!(alg = ?alg, "Token with unsupported algorithm rejected");
            }
            AuthError::Forbidden => {
                tracing::warn!("Admin route denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let reason = self.reason();
        let mut response = self.to_app_error().into_response();
        if let Some(reason) = reason {
            response
                .headers_mut()
                .insert(AUTH_REASON_HEADER, HeaderValue::from_static(reason));
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::InvalidInput(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Malformed => AuthError::TokenMalformed,
            JwtError::UnsupportedAlgorithm(alg) => AuthError::UnsupportedAlgorithm(alg),
            JwtError::EmptySecret | JwtError::Signing(_) => AuthError::Internal(err.to_string()),
        }
    }
}
