//! Shared Kernel - vocabulary shared by every backend crate
//!
//! - Error classification ([`error::kind::ErrorKind`]) and the unified
//!   [`error::app_error::AppError`] rendered as problem details
//! - Typed UUID identifiers ([`id::Id`])
//!
//! Nothing here knows about users, tokens or mail; those live in `auth`
//! and `platform`.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
