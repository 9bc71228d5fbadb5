/// Access Token Codec
///
/// Issues and verifies HS256-signed JWTs carrying a single subject claim.
/// Access tokens are never stored and cannot be revoked; a token stays
/// valid for its whole TTL, so short TTLs are the only mitigation.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::clock::Clock;
use crate::configuration::JwtSettings;
use crate::error::AuthError;

/// Issuer written into every token when none is configured
pub const DEFAULT_ISSUER: &str = "chirpy";

/// Upper bound on any access token lifetime, in seconds
pub const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl AccessTokenCodec {
    pub fn new(secret: &[u8], issuer: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is judged against the injected clock, not the library's
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            clock,
        }
    }

    pub fn from_settings(config: &JwtSettings, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.secret.as_bytes(), &config.issuer, clock)
    }

    /// Sign a new access token for `subject`
    ///
    /// # Errors
    /// Returns `SigningFailure` if the claims cannot be encoded
    pub fn issue(&self, subject: &Uuid, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims::new(*subject, self.clock.now(), ttl, &self.issuer);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::SigningFailure(e.to_string()))
    }

    /// Verify a token and return its subject
    ///
    /// # Errors
    /// - `InvalidSignature` if the token was not produced with this secret
    ///   and issuer, or cannot be decoded at all
    /// - `TokenExpired` once the clock is past the `exp` claim
    /// - `MalformedSubject` if the subject is not a user id
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => {
                        tracing::warn!("JWT signature mismatch");
                    }
                    other => {
                        tracing::warn!(reason = ?other, "JWT rejected before signature check");
                    }
                }
                AuthError::InvalidSignature
            })?;

        if claims.is_expired_at(self.clock.now()) {
            return Err(AuthError::TokenExpired);
        }

        claims.user_id()
    }
}

/// Clamp a requested lifetime into `(0, MAX_ACCESS_TOKEN_TTL_SECONDS]`
///
/// Missing or non-positive requests fall back to `default_seconds`, which
/// is itself capped.
pub fn bounded_ttl(requested_seconds: Option<i64>, default_seconds: i64) -> Duration {
    let default_seconds = default_seconds.clamp(1, MAX_ACCESS_TOKEN_TTL_SECONDS);
    let seconds = match requested_seconds {
        Some(seconds) if seconds > 0 => seconds.min(MAX_ACCESS_TOKEN_TTL_SECONDS),
        _ => default_seconds,
    };
    Duration::seconds(seconds)
}
