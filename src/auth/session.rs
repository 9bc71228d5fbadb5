/// Session Orchestrator
///
/// Composes the hasher, access-token codec and refresh-token registry into
/// the login / refresh / revoke flows:
///
/// unauthenticated -> login -> active (access + refresh issued)
/// active -> refresh -> active (new access token, same refresh token)
/// active -> revoke -> revoked
///
/// Failures come back with their precise `AuthError` kind; the HTTP layer
/// collapses every credential failure into one unauthenticated response.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::audit::{AuditLog, AuditLogger};
use actix_web::http::header::HeaderMap;

use crate::auth::header::bearer_token;
use crate::auth::jwt::{bounded_ttl, AccessTokenCodec, MAX_ACCESS_TOKEN_TTL_SECONDS};
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::{RefreshToken, RefreshTokenRegistry};
use crate::error::AuthError;
use crate::store::{UserRecord, UserStore};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

pub struct SessionService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    access_tokens: AccessTokenCodec,
    refresh_tokens: RefreshTokenRegistry,
    default_ttl_seconds: i64,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        access_tokens: AccessTokenCodec,
        refresh_tokens: RefreshTokenRegistry,
    ) -> Self {
        Self {
            users,
            hasher,
            access_tokens,
            refresh_tokens,
            default_ttl_seconds: MAX_ACCESS_TOKEN_TTL_SECONDS,
        }
    }

    /// Default access token lifetime; capped at one hour
    pub fn with_access_token_ttl(mut self, seconds: i64) -> Self {
        self.default_ttl_seconds = bounded_ttl(None, seconds).num_seconds();
        self
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Verify email and password, then issue an access token and a refresh token
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email, a wrong password or an
    ///   unreadable stored hash (indistinguishable)
    /// - `SigningFailure`, `EntropyFailure`, `PersistenceFailure` on infrastructure faults
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: Option<i64>,
    ) -> Result<LoginOutcome, AuthError> {
        let result = self.try_login(email, password, requested_ttl_seconds).await;

        let user_id = result.as_ref().ok().map(|outcome| outcome.user.id);
        AuditLogger::log(&AuditLog::for_result("LOGIN", "session", user_id, &result));

        result
    }

    async fn try_login(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: Option<i64>,
    ) -> Result<LoginOutcome, AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_dummy(password);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = match self.hasher.verify(password, &user.hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                // Answered like a wrong password so the account's existence stays hidden
                tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                false
            }
        };
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let ttl = bounded_ttl(requested_ttl_seconds, self.default_ttl_seconds);
        let access_token = self.access_tokens.issue(&user.id, ttl)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token (sent as a Bearer credential) for a new access token
    ///
    /// The refresh token is not rotated.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let mut user_id = None;
        let result = async {
            let token = bearer_token(headers)?;
            let owner = self.refresh_tokens.resolve(token).await?;
            user_id = Some(owner);
            self.access_tokens.issue(&owner, self.default_ttl())
        }
        .await;

        AuditLogger::log(&AuditLog::for_result("REFRESH", "refresh_token", user_id, &result));
        result
    }

    /// Revoke the refresh token sent as a Bearer credential
    ///
    /// The token must currently be valid; expired, revoked and unknown
    /// tokens all fail the same way.
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let mut user_id = None;
        let result = async {
            let token = bearer_token(headers)?;
            user_id = Some(self.refresh_tokens.resolve(token).await?);
            self.refresh_tokens.revoke(token).await
        }
        .await;

        AuditLogger::log(&AuditLog::for_result("REVOKE", "refresh_token", user_id, &result));
        result
    }

    /// Verify the access token sent as a Bearer credential
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        self.access_tokens.verify(bearer_token(headers)?)
    }

    fn default_ttl(&self) -> Duration {
        Duration::seconds(self.default_ttl_seconds)
    }
}
