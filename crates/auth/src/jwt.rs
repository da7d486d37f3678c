//! Bearer-token verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies a bearer token and yields its claims.
///
/// Object-safe so transports can hold an `Arc<dyn JwtValidator>` and tests can
/// substitute their own issuer.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>)
    -> Result<JwtClaims, TokenValidationError>;
}

/// HS256 validator over a shared secret.
pub struct Hs256JwtValidator {
    decoding_key: DecodingKey,
}

impl Hs256JwtValidator {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<JwtClaims, TokenValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Claims carry RFC3339 timestamps rather than numeric exp/iat; the
        // time window is checked by validate_claims against the caller clock.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
