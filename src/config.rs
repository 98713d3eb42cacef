//! Server configuration, loaded from environment variables at startup

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::relay::PartialResponsePolicy;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_DB_PATH: &str = "claude_play.db";
const DEFAULT_RATE_LIMIT_MAX: u32 = 60;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A variable is present but cannot be parsed
    #[error("{key} must be {expected}, got {value:?}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Debug,
    Release,
}

impl Mode {
    /// Default tracing filter for this mode
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Mode::Debug => "debug,hyper=info,reqwest=info,sqlx=warn",
            Mode::Release => "info",
        }
    }
}

/// Runtime configuration
#[derive(Clone)]
pub struct Config {
    /// TCP port to bind on all interfaces
    pub port: u16,
    pub mode: Mode,
    /// Bearer token sent to the upstream provider
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible API, without trailing slash
    pub openai_base_url: String,
    /// SQLite database file, used when `database_url` is unset
    pub db_path: String,
    /// PostgreSQL connection string
    pub database_url: Option<String>,
    /// Allowed CORS origins; `None` allows any origin
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Shared secret expected in the `X-API-Key` header
    pub server_api_key: Option<String>,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// Deadline for a whole upstream request, including streaming
    pub upstream_timeout: Option<Duration>,
    pub partial_response_policy: PartialResponsePolicy,
    /// Emit log records as JSON lines
    pub log_json: bool,
}

impl Config {
    /// Load `.env` (if any) and build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "PORT",
                        expected: "a number between 1 and 65535",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_PORT,
        };

        let mode = match get("MODE").as_deref() {
            None | Some("debug") => Mode::Debug,
            Some("release") => Mode::Release,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "MODE",
                    expected: "debug or release",
                    value: other.to_string(),
                })
            }
        };

        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|raw| {
            raw.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        });

        let rate_limit_max = parse_number(&get, "RATE_LIMIT_MAX", DEFAULT_RATE_LIMIT_MAX)?;
        let window_secs = parse_number(
            &get,
            "RATE_LIMIT_WINDOW_SECS",
            DEFAULT_RATE_LIMIT_WINDOW_SECS,
        )?;
        if window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_WINDOW_SECS",
                expected: "a positive number of seconds",
                value: "0".to_string(),
            });
        }

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(_) => match parse_number(&get, "UPSTREAM_TIMEOUT_SECS", 0u64)? {
                0 => {
                    return Err(ConfigError::InvalidValue {
                        key: "UPSTREAM_TIMEOUT_SECS",
                        expected: "a positive number of seconds",
                        value: "0".to_string(),
                    })
                }
                secs => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        let partial_response_policy = if parse_bool(&get, "PERSIST_PARTIAL_RESPONSES")? {
            PartialResponsePolicy::Persist
        } else {
            PartialResponsePolicy::Discard
        };

        Ok(Self {
            port,
            mode,
            openai_api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url,
            db_path: get("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            database_url: get("DATABASE_URL"),
            cors_allowed_origins,
            server_api_key: get("SERVER_API_KEY"),
            rate_limit_max,
            rate_limit_window: Duration::from_secs(window_secs),
            upstream_timeout,
            partial_response_policy,
            log_json: parse_bool(&get, "LOG_JSON")?,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("mode", &self.mode)
            .field("openai_api_key", &redacted(Some(&self.openai_api_key)))
            .field("openai_base_url", &self.openai_base_url)
            .field("db_path", &self.db_path)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("server_api_key", &redacted(self.server_api_key.as_ref()))
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("partial_response_policy", &self.partial_response_policy)
            .field("log_json", &self.log_json)
            .finish()
    }
}

fn redacted(secret: Option<&String>) -> Option<&'static str> {
    secret.filter(|s| !s.is_empty()).map(|_| "<redacted>")
}

fn parse_number<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key,
            expected: "a non-negative integer",
            value: raw,
        }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(false),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                expected: "true or false",
                value: raw,
            }),
        },
    }
}
