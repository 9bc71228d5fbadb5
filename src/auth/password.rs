/// Password Hashing and Verification
///
/// One-way bcrypt hashing. Strength rules do not live here: the empty
/// string is hashable and verifiable, and callers that want a policy
/// enforce it before reaching the hasher.

use bcrypt::{hash, verify};

use crate::error::AuthError;

const DUMMY_PASSWORD: &str = "chirpy-timing-equaliser";

/// bcrypt hasher bound to one work factor
pub struct PasswordHasher {
    cost: u32,
    // Verified against when the account does not exist so that lookups
    // of unknown emails cost the same as a wrong password.
    dummy_hash: String,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost
    ///
    /// # Errors
    /// Returns `HashingFailure` if the cost is outside bcrypt's range
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        let dummy_hash = hash(DUMMY_PASSWORD, cost)
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?;

        Ok(Self { cost, dummy_hash })
    }

    /// Hash a password with a fresh random salt
    ///
    /// # Errors
    /// Returns `HashingFailure` if bcrypt cannot produce a hash
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash(password, self.cost).map_err(|e| AuthError::HashingFailure(e.to_string()))
    }

    /// Verify a password against a stored hash
    ///
    /// A wrong password is `Ok(false)`, not an error.
    ///
    /// # Errors
    /// Returns `VerificationFailure` if `hash` is not a bcrypt hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        verify(password, hash).map_err(|e| AuthError::VerificationFailure(e.to_string()))
    }

    /// Spend one verification worth of work without an account to check.
    pub fn verify_dummy(&self, password: &str) {
        let _ = verify(password, &self.dummy_hash);
    }
}
