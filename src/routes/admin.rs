/// Operational endpoints for the request counter and test resets

use actix_web::{http::header::ContentType, web, HttpResponse};

use crate::auth::SessionService;
use crate::configuration::AdminSettings;
use crate::error::AppError;
use crate::metrics::ServiceMetrics;

/// GET /admin/metrics
pub async fn metrics(metrics: web::Data<ServiceMetrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!("Hits: {}", metrics.hits()))
}

/// POST /admin/reset
///
/// Zeroes the hit counter and deletes every user (their refresh tokens and
/// chirps go with them).
///
/// # Errors
/// - 403: `admin.reset_enabled` is off
pub async fn reset(
    admin: web::Data<AdminSettings>,
    metrics: web::Data<ServiceMetrics>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    if !admin.reset_enabled {
        return Err(AppError::Forbidden("Reset is disabled".to_string()));
    }

    metrics.reset();
    let removed = sessions.users().delete_all().await?;
    tracing::warn!(users_removed = removed, "Hit counter reset and all users deleted");

    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body("Reset OK"))
}
