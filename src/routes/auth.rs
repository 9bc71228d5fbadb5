/// Session Routes
///
/// Login, access-token refresh and refresh-token revocation. Refresh and
/// revoke take the refresh token as `Authorization: Bearer <token>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::SessionService;
use crate::error::AppError;
use crate::routes::users::UserResponse;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional access token lifetime; capped at one hour
    pub expires_in_seconds: Option<i64>,
}

/// Profile plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// New access token
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 400: malformed body
/// - 401: wrong email or password (same response for both)
/// - 500: hashing, signing or storage fault
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let outcome = sessions
        .login(form.email.trim(), &form.password, form.expires_in_seconds)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&outcome.user),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token.token,
    }))
}

/// POST /api/refresh
///
/// The refresh token is not rotated; it stays valid until it expires or
/// is revoked.
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let token = sessions.refresh(req.headers()).await?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /api/revoke
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    sessions.revoke(req.headers()).await?;

    Ok(HttpResponse::NoContent().finish())
}
