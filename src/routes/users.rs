/// Account Routes
///
/// Create an account and change its credentials. Responses carry the
/// public profile only, never the password hash.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionService;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::store::UserRecord;
use crate::validators::{is_valid_email, is_valid_password};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public profile of a user
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_premium: bool,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email.clone(),
            is_premium: user.is_premium,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or password
/// - 409: email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let hashed_password = sessions.hasher().hash(&form.password)?;
    let user = sessions.users().create(&email, &hashed_password).await?;

    tracing::info!(user_id = %user.id, "User created");

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// PUT /api/users
///
/// **Requires a valid access token.** Replaces the caller's email and password.
pub async fn update_user(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<CredentialsRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let hashed_password = sessions.hasher().hash(&form.password)?;
    let user = sessions
        .users()
        .update_credentials(caller.user_id, &email, &hashed_password)
        .await?;

    tracing::info!(user_id = %user.id, "User credentials updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}
