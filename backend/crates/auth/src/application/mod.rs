//! Application Layer
//!
//! Use cases and application services.

pub mod change_password;
pub mod check_session;
pub mod config;
pub mod email_verification;
pub mod get_user;
pub mod sign_in;
pub mod sign_up;
pub mod token_issuer;

// Re-exports
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use check_session::{CheckSessionUseCase, PresentedCredential, RejectReason, SessionState};
pub use config::AuthConfig;
pub use email_verification::EmailVerificationUseCase;
pub use get_user::GetUserUseCase;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpUseCase};
pub use token_issuer::{IssuedToken, TokenIssuer};
