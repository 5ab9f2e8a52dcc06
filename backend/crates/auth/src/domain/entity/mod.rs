//! Entity Module

pub mod session_claims;
pub mod user;
pub mod verification_token;
