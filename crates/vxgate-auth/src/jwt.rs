//! RS256 assertions for the service account JWT-bearer grant.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

use crate::credentials::ServiceAccountKey;
use crate::error::AdcError;

/// Grant type for the assertion exchange.
pub(crate) const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google accepts assertions valid for at most one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Build a signed assertion for `key`, issued at `issued_at` (unix seconds).
pub(crate) fn sign_assertion(
    key: &ServiceAccountKey,
    scopes: &[String],
    audience: &str,
    issued_at: i64,
) -> Result<String, AdcError> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| AdcError::InvalidKey(format!("not an RSA private key: {e}")))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&key.private_key_id);

    let claims = Claims {
        iss: &key.client_email,
        scope: scopes.join(" "),
        aud: audience,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, &encoding_key)
        .map_err(|e| AdcError::InvalidKey(format!("signing failed: {e}")))
}
