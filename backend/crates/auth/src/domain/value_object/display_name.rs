//! Display Name Value Object
//!
//! 画面表示用の氏名。トークンの `username` クレームにも載る。
//!
//! ## 不変条件
//! - 前後の空白は除去
//! - 1〜100文字
//! - 制御文字を含まない

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Maximum length for display name (in characters)
pub const DISPLAY_NAME_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(name: impl Into<String>) -> AuthResult<Self> {
        let name = name.into();
        let name = name.trim();

        if name.is_empty() {
            return Err(AuthError::InvalidInput("Display name cannot be empty".into()));
        }

        if name.chars().count() > DISPLAY_NAME_MAX_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Display name must be at most {} characters",
                DISPLAY_NAME_MAX_LENGTH
            )));
        }

        if name.chars().any(char::is_control) {
            return Err(AuthError::InvalidInput(
                "Display name contains invalid characters".into(),
            ));
        }

        Ok(Self(name.to_string()))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed() {
        let name = DisplayName::new("  Hanako Yamada ").unwrap();
        assert_eq!(name.as_str(), "Hanako Yamada");
    }

    #[test]
    fn test_rejects_blank_and_control() {
        assert!(DisplayName::new("").is_err());
        assert!(DisplayName::new(" \t ").is_err());
        assert!(DisplayName::new("line\nbreak").is_err());
    }

    #[test]
    fn test_length_in_characters() {
        assert!(DisplayName::new("山".repeat(DISPLAY_NAME_MAX_LENGTH)).is_ok());
        assert!(DisplayName::new("山".repeat(DISPLAY_NAME_MAX_LENGTH + 1)).is_err());
    }
}
