/// Persistence capabilities
///
/// Session logic and the chirp routes talk to storage only through these
/// traits so the backing store (Postgres, in-memory) can be swapped without
/// touching token code.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// A persisted refresh token. The plaintext token is never stored, only
/// its SHA-256 fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A user account as seen by the session layer
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_premium: bool,
}

/// A short post
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChirpRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError>;

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, DatabaseError>;

    /// Set `revoked_at` on a token that is not yet revoked.
    ///
    /// Returns the number of rows changed; zero for unknown or
    /// already-revoked tokens.
    async fn set_revoked(
        &self,
        token_hash: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    /// # Errors
    /// `UniqueConstraintViolation` if the email is taken
    async fn create(&self, email: &str, hashed_password: &str)
        -> Result<UserRecord, DatabaseError>;

    /// # Errors
    /// `NotFound` if no user has `id`
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError>;

    /// Returns false when no user has `id`.
    async fn mark_premium(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Delete every user together with their refresh tokens and chirps.
    ///
    /// Returns the number of users removed.
    async fn delete_all(&self) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    /// # Errors
    /// `NotFound` if `user_id` does not belong to an existing user
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, DatabaseError>;

    /// All chirps, or only those by `author`, oldest first
    async fn list_chirps(&self, author: Option<Uuid>) -> Result<Vec<ChirpRecord>, DatabaseError>;

    async fn find_chirp(&self, id: Uuid) -> Result<Option<ChirpRecord>, DatabaseError>;

    /// Returns false when no chirp has `id`.
    async fn delete_chirp(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
