//! Verification Code Value Object
//!
//! メール確認用の6桁数字コード。
//!
//! - 生成は OS の CSPRNG から一様に（先頭ゼロも保持）
//! - 入力は前後の空白を除去してから形式を検証
//! - `Debug` ではコードを出さない

use platform::crypto::random_numeric_code;
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Number of digits in a verification code
pub const CODE_DIGITS: usize = 6;

#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Draw a fresh code
    pub fn generate() -> Self {
        Self(random_numeric_code(CODE_DIGITS as u32))
    }

    /// Parse a code submitted by a user.
    ///
    /// A blank value is `InvalidInput`; anything else that is not exactly
    /// six ASCII digits can never match and is `InvalidCode`.
    pub fn parse(input: &str) -> AuthResult<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(AuthError::InvalidInput(
                "Verification code is required".into(),
            ));
        }

        if input.len() != CODE_DIGITS || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::InvalidCode);
        }

        Ok(Self(input.to_string()))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerificationCode").field(&"******").finish()
    }
}
