/// Refresh Token Registry
///
/// Refresh tokens are:
/// - 32 random bytes from the OS, hex-encoded (64 characters)
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Valid until they expire (60 days) or are revoked
/// - Never rotated, deleted or reissued; revocation only sets a timestamp
///
/// A user may hold any number of valid refresh tokens at once.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::store::{RefreshTokenRecord, RefreshTokenStore};

pub const REFRESH_TOKEN_BYTES: usize = 32;
pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 60;

/// Source of token entropy
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), AuthError>;
}

/// Operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), AuthError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| AuthError::EntropyFailure(e.to_string()))
    }
}

/// A freshly issued refresh token. `token` is the only copy of the
/// plaintext and goes straight to the client.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct RefreshTokenRegistry {
    store: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
    lifetime: Duration,
}

impl RefreshTokenRegistry {
    pub fn new(store: Arc<dyn RefreshTokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            entropy: Arc::new(OsEntropy),
            lifetime: Duration::days(DEFAULT_REFRESH_TOKEN_DAYS),
        }
    }

    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Issue and persist a new refresh token for `user_id`
    ///
    /// # Errors
    /// - `EntropyFailure` if no random bytes could be drawn
    /// - `PersistenceFailure` if the store write fails
    ///
    /// Nothing is returned unless the record was stored.
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, AuthError> {
        let token = self.generate_token()?;
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.lifetime;

        let record = RefreshTokenRecord {
            token_hash: hash_token(&token),
            user_id,
            issued_at,
            expires_at,
            revoked_at: None,
        };
        self.store.insert(&record).await?;

        tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Refresh token issued");

        Ok(RefreshToken {
            token,
            user_id,
            issued_at,
            expires_at,
        })
    }

    /// Resolve a presented token to its owner
    ///
    /// Checks:
    /// 1. Token exists in the store
    /// 2. Token has not expired
    /// 3. Token has not been revoked
    ///
    /// # Errors
    /// `TokenNotFound`, `TokenExpired`, `TokenRevoked` for the checks above,
    /// `PersistenceFailure` if the lookup fails
    pub async fn resolve(&self, token: &str) -> Result<Uuid, AuthError> {
        let record = self
            .store
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if record.is_expired_at(self.clock.now()) {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(AuthError::TokenExpired);
        }

        if record.is_revoked() {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked);
        }

        Ok(record.user_id)
    }

    /// Revoke a token
    ///
    /// Unknown and already-revoked tokens are a no-op.
    ///
    /// # Errors
    /// Returns `PersistenceFailure` if the store update fails
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let affected = self
            .store
            .set_revoked(&hash_token(token), self.clock.now())
            .await?;

        if affected == 0 {
            tracing::debug!("Revoke matched no active refresh token");
        }
        Ok(())
    }

    fn generate_token(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.entropy.fill(&mut bytes)?;
        Ok(hex::encode(bytes))
    }
}

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
