/// Authorization header parsing
///
/// `Authorization: <Scheme> <credential>` where the value splits on single
/// spaces into exactly two parts. Pure parsing; nothing here touches storage.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Credential scheme expected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    ApiKey,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::ApiKey => "ApiKey",
        }
    }
}

/// Extract the bare credential from an `Authorization` header value
///
/// # Errors
/// - `MissingAuthHeader` when the value is absent or empty
/// - `MalformedAuthHeader` when the value is not `<Scheme> <credential>`
pub fn extract_credential<'a>(
    header: Option<&'a str>,
    scheme: AuthScheme,
) -> Result<&'a str, AuthError> {
    let value = match header {
        None | Some("") => return Err(AuthError::MissingAuthHeader),
        Some(value) => value,
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [word, credential] if *word == scheme.as_str() && !credential.is_empty() => {
            Ok(*credential)
        }
        _ => Err(AuthError::MalformedAuthHeader),
    }
}

/// Raw `Authorization` value, if present
///
/// # Errors
/// Returns `MalformedAuthHeader` if the value is not visible ASCII
pub fn authorization_value(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedAuthHeader))
        .transpose()
}

/// `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    extract_credential(authorization_value(headers)?, AuthScheme::Bearer)
}

/// `Authorization: ApiKey <key>`
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    extract_credential(authorization_value(headers)?, AuthScheme::ApiKey)
}

/// Check `Authorization: ApiKey <key>` against a static shared secret
///
/// Digests are compared instead of the raw keys so the comparison time
/// does not depend on how many leading bytes match.
///
/// # Errors
/// Header errors as for `api_key`; `InvalidCredentials` on a wrong key
pub fn verify_api_key(headers: &HeaderMap, expected: &str) -> Result<(), AuthError> {
    let presented = api_key(headers)?;

    if Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
