//! Process configuration read from the environment.

use std::time::Duration;

use thiserror::Error;

use agora_observability::LogFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,

    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    /// Name of the cookie carrying the session token.
    pub session_cookie: String,
    /// Upper bound on each session/role lookup. `None` waits indefinitely.
    pub role_fetch_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            use_persistent_stores: false,
            database_url: None,
            session_cookie: "session".to_string(),
            role_fetch_timeout: None,
            log_format: LogFormat::Json,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source (env in production, maps in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let use_persistent_stores = match lookup("USE_PERSISTENT_STORES") {
            Some(v) => parse_bool("USE_PERSISTENT_STORES", &v)?,
            None => defaults.use_persistent_stores,
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let role_fetch_timeout = match lookup("ROLE_FETCH_TIMEOUT_MS") {
            Some(v) if !v.trim().is_empty() => {
                let ms: u64 = v.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "ROLE_FETCH_TIMEOUT_MS",
                    value: v.clone(),
                })?;
                Some(Duration::from_millis(ms))
            }
            _ => None,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            use_persistent_stores,
            database_url,
            session_cookie: lookup("SESSION_COOKIE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.session_cookie),
            role_fetch_timeout,
            log_format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
        }),
    }
}
