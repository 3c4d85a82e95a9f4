use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBRARY_ENV";
const CONFIG_DIR_ENV: &str = "LIBRARY_CONFIG_DIR";
const ENV_PREFIX: &str = "LIBRARY";

/// Flat database variables accepted alongside the nested `LIBRARY_DATABASE__*` form.
const DATABASE_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("database.host", "LIBRARY_DB_HOST"),
    ("database.port", "LIBRARY_DB_PORT"),
    ("database.username", "LIBRARY_DB_USERNAME"),
    ("database.name", "LIBRARY_DB_NAME"),
    ("database.password", "LIBRARY_DB_PASSWORD"),
];

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay and variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment: Environment = std::env::var(ENV_VAR_NAME)
            .unwrap_or_else(|_| DEFAULT_ENV.to_string())
            .parse()?;

        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, environment)
    }

    /// Load configuration from an explicit directory and environment.
    pub fn load_from(config_dir: &std::path::Path, environment: Environment) -> anyhow::Result<Self> {
        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment.as_str()));

        let mut builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );

        for (key, variable) in DATABASE_ENV_OVERRIDES {
            builder = builder
                .set_override_option(*key, std::env::var(variable).ok())
                .with_context(|| format!("invalid override for {}", variable))?;
        }

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = environment;

        Ok(settings)
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long in-flight requests may run after a shutdown signal.
    #[serde(default = "ServerSettings::default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        4000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    fn default_shutdown_grace_secs() -> u64 {
        10
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            shutdown_grace_secs: Self::default_shutdown_grace_secs(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default = "DatabaseSettings::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseSettings::default_username")]
    pub username: String,
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseSettings::default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    fn default_host() -> String {
        "localhost".to_string()
    }

    fn default_port() -> u16 {
        5432
    }

    fn default_username() -> String {
        "postgres".to_string()
    }

    fn default_name() -> String {
        "library".to_string()
    }

    fn default_max_connections() -> u32 {
        10
    }

    fn default_acquire_timeout_secs() -> u64 {
        5
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            username: Self::default_username(),
            name: Self::default_name(),
            password: String::new(),
            max_connections: Self::default_max_connections(),
            acquire_timeout_secs: Self::default_acquire_timeout_secs(),
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Directive used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=debug,sqlx=warn".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "AuthSettings::default_bearer_token")]
    pub bearer_token: String,
}

impl AuthSettings {
    fn default_bearer_token() -> String {
        "authortoken".to_string()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bearer_token: Self::default_bearer_token(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}
