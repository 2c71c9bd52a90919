use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 3333;
const CONFIG_DIR: &str = "config";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 365;
const DEFAULT_RESET_TOKEN_TTL_SECS: i64 = 240;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEV_DEFAULT_JWT_SECRET: &str = "development_only_bookstore_secret_change_me_before_deploying";

/// Application configuration, layered from defaults, `config/` files and `APP__*` variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (sqlite or postgres)
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Secret used to sign access and password reset tokens
    #[validate(custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Lifetime of access tokens in days
    #[serde(default = "default_token_ttl_days")]
    #[validate(range(min = 1))]
    pub token_ttl_days: i64,

    /// Lifetime of password reset tokens in seconds
    #[serde(default = "default_reset_token_ttl_secs")]
    #[validate(range(min = 1))]
    pub reset_token_ttl_secs: i64,

    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// development, staging or production
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Run pending migrations on startup
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,

    /// Comma separated keys accepted in the `verifyme` header. Unset disables the check.
    #[serde(default)]
    pub verification_keys: Option<String>,

    /// Directory that stores uploaded files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Base URL used when building links to uploaded files
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow any origin outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Builds a configuration with defaults for everything but the essentials.
    pub fn new(
        database_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            token_ttl_days: default_token_ttl_days(),
            reset_token_ttl_secs: default_reset_token_ttl_secs(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: default_auto_migrate(),
            verification_keys: None,
            upload_dir: default_upload_dir(),
            public_base_url: None,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            max_body_bytes: default_max_body_bytes(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn has_cors_allowed_origins(&self) -> bool {
        self.cors_origins().next().is_some()
    }

    /// Iterates the configured CORS origins, skipping blanks.
    pub fn cors_origins(&self) -> impl Iterator<Item = &str> {
        split_list(self.cors_allowed_origins.as_deref())
    }

    /// Keys accepted in the `verifyme` header.
    pub fn verification_key_list(&self) -> Vec<String> {
        split_list(self.verification_keys.as_deref())
            .map(str::to_string)
            .collect()
    }

    /// Base URL for links to uploaded files, falling back to the bind address.
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message =
                Some("The development JWT secret must not be used outside development".into());
            errors.add("jwt_secret", err);
        }

        if self.is_production() && self.verification_key_list().is_empty() {
            let mut err = ValidationError::new("verification_keys_required");
            err.message = Some("Set APP__VERIFICATION_KEYS in production".into());
            errors.add("verification_keys", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_ttl_days() -> i64 {
    DEFAULT_TOKEN_TTL_DAYS
}

fn default_reset_token_ttl_secs() -> i64 {
    DEFAULT_RESET_TOKEN_TTL_SECS
}

fn default_auto_migrate() -> bool {
    true
}

fn default_upload_dir() -> String {
    DEFAULT_UPLOAD_DIR.to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    8
}

fn default_db_idle_timeout_secs() -> u64 {
    300
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    if trimmed.len() < 32 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be at least 32 characters".into());
        return Err(err);
    }

    const DISALLOWED: [&str; 3] = ["your-secret-key", "default-secret-key", "changeme"];
    if DISALLOWED
        .iter()
        .any(|&bad| trimmed.eq_ignore_ascii_case(bad))
    {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret uses a placeholder value".into());
        return Err(err);
    }

    Ok(())
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("bookstore_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. `config/default.toml`
/// 3. `config/{RUN_ENV}.toml`
/// 4. Environment variables (`APP__*`)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on defaults and environment variables",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://bookstore.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;

    // The development secret only applies when nothing else provides one.
    if run_env.eq_ignore_ascii_case(DEFAULT_ENV) {
        builder = builder.set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?;
    }

    let config = builder
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    if app_config.verification_key_list().is_empty() {
        warn!("No verification keys configured; the verifyme header check is disabled");
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "a_perfectly_reasonable_secret_for_the_tests_0123456789".into(),
            "127.0.0.1".into(),
            3333,
            "production".into(),
        )
    }

    #[test]
    fn production_requires_cors_origins_and_keys() {
        let cfg = base_config();
        let errors = cfg.validate_additional_constraints().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("cors_allowed_origins"));
        assert!(fields.contains_key("verification_keys"));
    }

    #[test]
    fn production_with_origins_and_keys_passes() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://books.example.com".into());
        cfg.verification_keys = Some("key-one, key-two".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn development_allows_permissive_cors() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        assert!(cfg.should_allow_permissive_cors());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn dev_secret_rejected_outside_development() {
        let mut cfg = base_config();
        cfg.jwt_secret = DEV_DEFAULT_JWT_SECRET.into();
        cfg.cors_allow_any_origin = true;
        cfg.verification_keys = Some("k".into());
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn short_jwt_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn verification_keys_are_split_and_trimmed() {
        let mut cfg = base_config();
        cfg.verification_keys = Some(" alpha ,, beta ".into());
        assert_eq!(cfg.verification_key_list(), vec!["alpha", "beta"]);
    }

    #[test]
    fn public_base_url_falls_back_to_bind_address() {
        let mut cfg = base_config();
        assert_eq!(cfg.public_base_url(), "http://127.0.0.1:3333");
        cfg.public_base_url = Some("https://cdn.example.com/".into());
        assert_eq!(cfg.public_base_url(), "https://cdn.example.com");
    }
}
