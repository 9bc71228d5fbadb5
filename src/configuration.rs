use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    pub webhooks: WebhookSettings,
    #[serde(default)]
    pub admin: AdminSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Keep users and refresh tokens in process memory instead of Postgres
    #[serde(default)]
    pub in_memory: bool,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds, capped at 3600
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

/// Password hashing and refresh token settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
    #[serde(default = "default_refresh_token_expiry_days")]
    pub refresh_token_expiry_days: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            password_hash_cost: default_password_hash_cost(),
            refresh_token_expiry_days: default_refresh_token_expiry_days(),
        }
    }
}

/// Shared secret for the payment provider webhook (`Authorization: ApiKey <key>`)
#[derive(serde::Deserialize, Clone)]
pub struct WebhookSettings {
    pub polka_key: String,
}

/// Operational endpoint switches
#[derive(serde::Deserialize, Clone, Default)]
pub struct AdminSettings {
    /// Allow `POST /admin/reset` to delete every user; development only
    #[serde(default)]
    pub reset_enabled: bool,
}

fn default_access_token_expiry() -> i64 {
    crate::auth::MAX_ACCESS_TOKEN_TTL_SECONDS
}

fn default_issuer() -> String {
    crate::auth::DEFAULT_ISSUER.to_string()
}

fn default_password_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_refresh_token_expiry_days() -> i64 {
    crate::auth::DEFAULT_REFRESH_TOKEN_DAYS
}

impl Settings {
    /// Reject configurations that must not serve traffic
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.webhooks.polka_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired("webhooks.polka_key".to_string()));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.auth.refresh_token_expiry_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_expiry_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `configuration.{yaml,toml,json}` (optional) overlaid with
/// `APP_<SECTION>__<KEY>` environment variables.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
