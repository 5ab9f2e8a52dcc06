//! HS256 JSON Web Tokens
//!
//! Thin codec over `jsonwebtoken` that pins the algorithm and issuer.
//! Expiry is *not* checked here: callers compare `exp` against their own
//! clock so the boundary instant is exact and testable.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// The only accepted signing algorithm
pub const ALGORITHM: Algorithm = Algorithm::HS256;

const ALGORITHM_NAME: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Signing secret is empty")]
    EmptySecret,

    #[error("Token is malformed or its signature is invalid")]
    Malformed,

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Signing and verification keys derived from one shared secret.
///
/// The secret bytes are only borrowed during construction.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &[u8], issuer: &str) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[issuer]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn encode<C: Serialize>(&self, claims: &C) -> Result<String, JwtError> {
        jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm and issuer, then deserialize the claims.
    pub fn decode<C: DeserializeOwned>(&self, token: &str) -> Result<C, JwtError> {
        let alg = header_algorithm(token)?;
        if alg != ALGORITHM_NAME {
            return Err(JwtError::UnsupportedAlgorithm(alg));
        }

        jsonwebtoken::decode::<C>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidAlgorithm => JwtError::UnsupportedAlgorithm(alg),
                _ => JwtError::Malformed,
            })
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Read `alg` straight from the header segment.
///
/// `jsonwebtoken` cannot even parse a header naming an algorithm it does
/// not know (`none` included), which would otherwise surface as a generic
/// parse failure.
fn header_algorithm(token: &str) -> Result<String, JwtError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(JwtError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| JwtError::Malformed)?;
    let raw: RawHeader = serde_json::from_slice(&bytes).map_err(|_| JwtError::Malformed)?;
    Ok(raw.alg)
}
