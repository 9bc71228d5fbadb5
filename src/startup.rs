use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use chrono::Duration;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AccessTokenCodec, PasswordHasher, RefreshTokenRegistry, SessionService};
use crate::clock::Clock;
use crate::configuration::{AdminSettings, Settings, WebhookSettings};
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::metrics::ServiceMetrics;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user,
};
use crate::store::{ChirpStore, RefreshTokenStore, UserStore};

/// Wire the auth components from settings over the given stores and clock
pub fn build_session_service(
    settings: &Settings,
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
) -> Result<SessionService, AppError> {
    let hasher = PasswordHasher::new(settings.auth.password_hash_cost)?;
    let codec = AccessTokenCodec::from_settings(&settings.jwt, clock.clone());
    let registry = RefreshTokenRegistry::new(refresh_tokens, clock)
        .with_lifetime(Duration::days(settings.auth.refresh_token_expiry_days));

    Ok(SessionService::new(users, hasher, codec, registry)
        .with_access_token_ttl(settings.jwt.access_token_expiry))
}

pub fn run(
    listener: TcpListener,
    sessions: SessionService,
    chirps: Arc<dyn ChirpStore>,
    metrics_state: web::Data<ServiceMetrics>,
    webhooks: WebhookSettings,
    admin: AdminSettings,
) -> Result<Server, std::io::Error> {
    let sessions = web::Data::new(sessions);
    let chirps: web::Data<dyn ChirpStore> = web::Data::from(chirps);
    let webhooks = web::Data::new(webhooks);
    let admin = web::Data::new(admin);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware::new(metrics_state.clone()))

            // Shared state
            .app_data(sessions.clone())
            .app_data(chirps.clone())
            .app_data(webhooks.clone())
            .app_data(admin.clone())
            .app_data(metrics_state.clone())

            // Public routes
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/api/polka/webhooks", web::post().to(polka_webhook))

            // Protected methods (require an access token) are registered
            // first; other methods fall through to the public resource
            .service(
                web::resource("/api/users")
                    .guard(guard::Put())
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route(web::put().to(update_user)),
            )
            .service(web::resource("/api/users").route(web::post().to(create_user)))
            .service(
                web::resource("/api/chirps")
                    .guard(guard::Post())
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route(web::post().to(create_chirp)),
            )
            .service(web::resource("/api/chirps").route(web::get().to(list_chirps)))
            .service(
                web::resource("/api/chirps/{id}")
                    .guard(guard::Delete())
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route(web::delete().to(delete_chirp)),
            )
            .service(web::resource("/api/chirps/{id}").route(web::get().to(get_chirp)))

            // Operational
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
