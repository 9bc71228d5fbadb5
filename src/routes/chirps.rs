/// Chirp Routes
///
/// Reading is public. Posting and deleting sit behind `JwtMiddleware`, and
/// only the author may delete a chirp.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, DatabaseError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::store::{ChirpRecord, ChirpStore};
use crate::validators::clean_chirp;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

#[derive(Serialize)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl From<ChirpRecord> for ChirpResponse {
    fn from(chirp: ChirpRecord) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(value: Option<&str>) -> Result<Self, ValidationError> {
        match value {
            None | Some("") | Some("asc") => Ok(SortOrder::Asc),
            Some("desc") => Ok(SortOrder::Desc),
            Some(_) => Err(ValidationError::InvalidFormat("sort".to_string())),
        }
    }
}

fn parse_id(value: &str, field: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidFormat(field.to_string()))
}

fn chirp_not_found() -> AppError {
    AppError::Database(DatabaseError::NotFound("chirp".to_string()))
}

/// POST /api/chirps
///
/// **Requires a valid access token.**
///
/// # Errors
/// - 400: empty body or longer than 140 characters
/// - 404: the author's account no longer exists
pub async fn create_chirp(
    caller: web::ReqData<AuthenticatedUser>,
    form: web::Json<ChirpRequest>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let body = clean_chirp(&form.body)?;
    let chirp = chirps.create_chirp(caller.user_id, &body).await?;

    tracing::info!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Chirp created");

    Ok(HttpResponse::Created().json(ChirpResponse::from(chirp)))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
///
/// # Errors
/// - 400: `sort` is neither `asc` nor `desc`, or `author_id` is not a UUID
pub async fn list_chirps(
    query: web::Query<ListChirpsQuery>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let order = SortOrder::parse(query.sort.as_deref())?;
    let author = match query.author_id.as_deref() {
        None | Some("") => None,
        Some(value) => Some(parse_id(value, "author_id")?),
    };

    let mut records = chirps.list_chirps(author).await?;
    if order == SortOrder::Desc {
        records.reverse();
    }

    let response: Vec<ChirpResponse> = records.into_iter().map(ChirpResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/chirps/{id}
pub async fn get_chirp(
    path: web::Path<String>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path, "id")?;
    let chirp = chirps.find_chirp(id).await?.ok_or_else(chirp_not_found)?;

    Ok(HttpResponse::Ok().json(ChirpResponse::from(chirp)))
}

/// DELETE /api/chirps/{id}
///
/// **Requires a valid access token.**
///
/// # Errors
/// - 403: the caller is not the author
/// - 404: no such chirp
pub async fn delete_chirp(
    caller: web::ReqData<AuthenticatedUser>,
    path: web::Path<String>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path, "id")?;
    let chirp = chirps.find_chirp(id).await?.ok_or_else(chirp_not_found)?;

    if chirp.user_id != caller.user_id {
        return Err(AppError::Forbidden(
            "Chirps can only be deleted by their author".to_string(),
        ));
    }

    if !chirps.delete_chirp(id).await? {
        return Err(chirp_not_found());
    }

    tracing::info!(chirp_id = %id, user_id = %caller.user_id, "Chirp deleted");

    Ok(HttpResponse::NoContent().finish())
}
