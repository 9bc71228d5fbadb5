/// Authentication module
///
/// Password hashing, Authorization header parsing, JWT access tokens,
/// refresh token management and the session flows built on them.

mod claims;
mod header;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::Claims;
pub use header::{
    api_key, authorization_value, bearer_token, extract_credential, verify_api_key, AuthScheme,
};
pub use jwt::{bounded_ttl, AccessTokenCodec, DEFAULT_ISSUER, MAX_ACCESS_TOKEN_TTL_SECONDS};
pub use password::PasswordHasher;
pub use refresh_token::{
    EntropySource, OsEntropy, RefreshToken, RefreshTokenRegistry, DEFAULT_REFRESH_TOKEN_DAYS,
    REFRESH_TOKEN_BYTES,
};
pub use session::{LoginOutcome, SessionService};
