/// Payment Provider Webhooks
///
/// Authenticated with `Authorization: ApiKey <key>` against the configured
/// shared secret before the body is even looked at. Only `user.upgraded`
/// does anything; other events and undecodable payloads are acknowledged
/// with 204 so the provider stops retrying.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{verify_api_key, SessionService};
use crate::configuration::WebhookSettings;
use crate::error::AppError;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
struct WebhookRequest {
    event: String,
    data: WebhookData,
}

#[derive(Deserialize)]
struct WebhookData {
    user_id: String,
}

/// POST /api/polka/webhooks
///
/// # Errors
/// - 401: missing, malformed or wrong API key
/// - 404: `user.upgraded` for an unknown user
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    webhooks: web::Data<WebhookSettings>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    if let Err(e) = verify_api_key(req.headers(), &webhooks.polka_key) {
        tracing::warn!(kind = e.kind(), "Webhook rejected");
        return Ok(HttpResponse::Unauthorized().finish());
    }

    let payload: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring undecodable webhook payload");
            return Ok(HttpResponse::NoContent().finish());
        }
    };

    if payload.event != USER_UPGRADED {
        tracing::debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = match Uuid::parse_str(&payload.data.user_id) {
        Ok(user_id) => user_id,
        Err(_) => {
            tracing::warn!(user_id = %payload.data.user_id, "Ignoring upgrade with invalid user_id");
            return Ok(HttpResponse::NoContent().finish());
        }
    };

    if sessions.users().mark_premium(user_id).await? {
        tracing::info!(user_id = %user_id, "User upgraded to premium");
        Ok(HttpResponse::NoContent().finish())
    } else {
        tracing::warn!(user_id = %user_id, "Upgrade requested for unknown user");
        Ok(HttpResponse::NotFound().finish())
    }
}
