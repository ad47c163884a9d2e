use std::time::Duration;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Every caller is anonymous; mutations are unrestricted.
    Open,
    /// A fronting proxy asserts the caller's pharmacy id in a trusted header.
    Proxy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub proxy: Option<ProxyAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyAuthConfig {
    pub header: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
    pub backend: DatabaseBackend,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address as a string in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Upper bound on a single staged query, in milliseconds.
    pub timeout_ms: u64,
    /// Fail queries with an index-unavailable error instead of scanning.
    pub require_spatial_index: bool,
    /// Ignore medicine entries whose expiry date has passed.
    pub hide_expired: bool,
}

impl SearchConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            require_spatial_index: false,
            hide_expired: false,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// Keys whose leaf name contains an underscore (`search.timeout_ms`) can't be
    /// reached through the `_`-separated environment source; set them in
    /// `config.toml` instead.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("database.backend", "postgres")?
            .set_default("database.run_migrations", true)?
            .set_default("logging.level", "debug")?
            .set_default("auth.method", "open")?
            .set_default("search.timeout_ms", 5000)?
            .set_default("search.require_spatial_index", false)?
            .set_default("search.hide_expired", false)?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Checks cross-field constraints that serde can't express.
    ///
    /// ## Errors
    /// Returns `ConfigError` if proxy auth is selected without a header, or if
    /// the search timeout is zero.
    pub fn validate(&self) -> crate::error::CoreResult<()> {
        use crate::error::CoreError;

        if self.auth.method == AuthMethod::Proxy
            && self
                .auth
                .proxy
                .as_ref()
                .is_none_or(|proxy| proxy.header.trim().is_empty())
        {
            return Err(CoreError::ConfigError(
                "auth.method = proxy requires auth.proxy.header".to_string(),
            ));
        }

        if self.search.timeout_ms == 0 {
            return Err(CoreError::ConfigError(
                "search.timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading, deserializing, or validating the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    settings.validate()?;
    Ok(settings)
}
