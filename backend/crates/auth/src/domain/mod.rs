//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    session_claims::{SessionClaims, TokenSubject},
    user::User,
    verification_token::{VerificationReason, VerificationToken},
};
pub use repository::{UserRepository, VerificationTokenRepository};
