//! Signed claims tokens.
//!
//! Wire format: `v1.<base64url(claims)>.<base64url(mac)>`, HMAC-SHA256 under
//! the process-wide secret. The string is opaque to callers; only the codec
//! parses it. The codec never consults storage, claims are re-checked against
//! live records by the session layer on every use.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

const HEADER: &str = "v1.";

type HmacSha256 = Hmac<Sha256>;

/// Payload embedded in a token.
///
/// Unknown fields are rejected on decode so a token minted with a newer
/// claims layout cannot be silently downgraded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub name: String,
    pub credential: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid token header")]
    InvalidHeader,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    InvalidSignature,
}

/// Stateless encoder/verifier for claims tokens.
///
/// Holds the signing secret injected at startup; construct once and share.
pub struct TokenCodec {
    secret: SecretString,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size")
    }

    /// Serialize and sign a claims payload.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON encoding fails.
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(claims)?;
        let payload_b64 = Base64UrlUnpadded::encode_string(&payload);

        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        let tag = mac.finalize().into_bytes();
        let tag_b64 = Base64UrlUnpadded::encode_string(&tag);

        Ok(format!("{HEADER}{payload_b64}.{tag_b64}"))
    }

    /// Verify a token and return its claims.
    ///
    /// The MAC is checked in constant time before the payload is parsed;
    /// nothing inside the token is trusted until the tag verifies.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, the signature does not
    /// verify, or the payload is not a valid claims object.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let rest = token.strip_prefix(HEADER).ok_or(TokenError::InvalidHeader)?;

        let (payload_b64, tag_b64) = rest.split_once('.').ok_or(TokenError::TokenFormat)?;
        if payload_b64.is_empty() || tag_b64.is_empty() || tag_b64.contains('.') {
            return Err(TokenError::TokenFormat);
        }

        let tag = Base64UrlUnpadded::decode_vec(tag_b64).map_err(|_| TokenError::Base64)?;

        let mut mac = self.mac();
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| TokenError::InvalidSignature)?;

        let payload = Base64UrlUnpadded::decode_vec(payload_b64).map_err(|_| TokenError::Base64)?;
        Ok(serde_json::from_slice(&payload)?)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenCodec([REDACTED])")
    }
}
