//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Password hashing (Argon2id)
//! - HS256 JSON Web Tokens
//! - Random one-time codes
//! - Session cookie and bearer credential handling
//! - Outbound mail transport

pub mod cookie;
pub mod crypto;
pub mod jwt;
pub mod mail;
pub mod password;
