//! Cryptographic Utilities

use rand::{Rng, rngs::OsRng};

/// Widest code that still fits a `u64` range
pub const MAX_CODE_DIGITS: u32 = 19;

/// Uniformly random decimal code of exactly `digits` characters, zero padded.
///
/// Drawn from the operating system CSPRNG; `gen_range` rejection-samples so
/// every value in `0..10^digits` is equally likely.
pub fn random_numeric_code(digits: u32) -> String {
    let digits = digits.clamp(1, MAX_CODE_DIGITS);
    let upper = 10u64.pow(digits);
    let value = OsRng.gen_range(0..upper);
    format!("{:0width$}", value, width = digits as usize)
}
