use actix_web::web;
use chirpy::clock::{Clock, SystemClock};
use chirpy::configuration::get_configuration;
use chirpy::metrics::ServiceMetrics;
use chirpy::startup::{build_session_service, run};
use chirpy::store::{ChirpStore, InMemoryStore, PgStore, RefreshTokenStore, UserStore};
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // 구조화된 로깅 초기화
    init_telemetry();

    tracing::info!("Starting application");

    // 설정 로드
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // 저장소 선택: 메모리 또는 Postgres
    let users: Arc<dyn UserStore>;
    let refresh_tokens: Arc<dyn RefreshTokenStore>;
    let chirps: Arc<dyn ChirpStore>;
    if configuration.database.in_memory {
        tracing::warn!("Using in-memory store; data is lost on restart");
        let store = Arc::new(InMemoryStore::new());
        users = store.clone();
        refresh_tokens = store.clone();
        chirps = store;
    } else {
        tracing::info!("Attempting to connect to database");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&configuration.database.connection_string())
            .await
            .map_err(|e| {
                tracing::error!("Failed to create connection pool: {}", e);
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "Database connection error",
                )
            })?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
        })?;

        tracing::info!("Database connection pool created successfully");
        let store = Arc::new(PgStore::new(pool));
        users = store.clone();
        refresh_tokens = store.clone();
        chirps = store;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sessions = build_session_service(&configuration, users, refresh_tokens, clock)
        .map_err(|e| {
            tracing::error!("Failed to build session service: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Auth configuration error")
        })?;

    // 서버 주소 설정
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    // 서버 실행
    let metrics = web::Data::new(ServiceMetrics::new());
    if configuration.admin.reset_enabled {
        tracing::warn!("POST /admin/reset is enabled and deletes all users");
    }

    let server = run(
        listener,
        sessions,
        chirps,
        metrics,
        configuration.webhooks.clone(),
        configuration.admin.clone(),
    )?;
    tracing::info!("Server started successfully");

    server.await
}
