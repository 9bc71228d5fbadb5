use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ChirpRecord, ChirpStore, RefreshTokenRecord, RefreshTokenStore, UserRecord, UserStore};
use crate::error::DatabaseError;

/// Process-local store for tests and database-less runs
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
    // Insertion order is creation order
    chirps: Mutex<Vec<ChirpRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DatabaseError> {
        mutex
            .lock()
            .map_err(|_| DatabaseError::UnexpectedError("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        let mut tokens = Self::lock(&self.refresh_tokens)?;
        if tokens.contains_key(&record.token_hash) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token already exists".to_string(),
            ));
        }
        tokens.insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(Self::lock(&self.refresh_tokens)?.get(token_hash).cloned())
    }

    async fn set_revoked(
        &self,
        token_hash: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let mut tokens = Self::lock(&self.refresh_tokens)?;
        match tokens.get_mut(token_hash) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(revoked_at);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(Self::lock(&self.users)?
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError> {
        let mut users = Self::lock(&self.users)?;
        if users.values().any(|user| user.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_premium: false,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError> {
        let mut users = Self::lock(&self.users)?;
        if users.values().any(|user| user.email == email && user.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn mark_premium(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut users = Self::lock(&self.users)?;
        match users.get_mut(&id) {
            Some(user) => {
                user.is_premium = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let mut users = Self::lock(&self.users)?;
        let removed = users.len() as u64;
        users.clear();
        Self::lock(&self.refresh_tokens)?.clear();
        Self::lock(&self.chirps)?.clear();
        Ok(removed)
    }
}

#[async_trait]
impl ChirpStore for InMemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, DatabaseError> {
        let users = Self::lock(&self.users)?;
        if !users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound("user".to_string()));
        }

        let now = Utc::now();
        let chirp = ChirpRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        Self::lock(&self.chirps)?.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self, author: Option<Uuid>) -> Result<Vec<ChirpRecord>, DatabaseError> {
        let mut chirps: Vec<ChirpRecord> = Self::lock(&self.chirps)?
            .iter()
            .filter(|chirp| author.map_or(true, |id| chirp.user_id == id))
            .cloned()
            .collect();
        chirps.sort_by_key(|chirp| chirp.created_at);
        Ok(chirps)
    }

    async fn find_chirp(&self, id: Uuid) -> Result<Option<ChirpRecord>, DatabaseError> {
        Ok(Self::lock(&self.chirps)?
            .iter()
            .find(|chirp| chirp.id == id)
            .cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut chirps = Self::lock(&self.chirps)?;
        let before = chirps.len();
        chirps.retain(|chirp| chirp.id != id);
        Ok(chirps.len() != before)
    }
}
