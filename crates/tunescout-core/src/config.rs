use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::ClientCredentials;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_DB_PATH: &str = "tunescout.sqlite3";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const DEFAULT_PREFETCH_LIMIT: u32 = 15;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("{variable} is required")]
    Missing { variable: &'static str },
    #[error("{variable} must be a positive integer, got '{value}'")]
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    #[error("{variable} must not be empty")]
    Empty { variable: &'static str },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub catalog_base_url: String,
    pub token_url: String,
    pub credentials: Option<ClientCredentials>,
    pub database_path: PathBuf,
    pub debounce: Duration,
    pub search_limit: u32,
    pub prefetch_limit: u32,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            credentials: None,
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            debounce: DEFAULT_DEBOUNCE,
            search_limit: DEFAULT_SEARCH_LIMIT,
            prefetch_limit: DEFAULT_PREFETCH_LIMIT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |variable: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(variable) {
                None => Ok(None),
                Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { variable }),
                Some(value) => Ok(Some(value.trim().to_string())),
            }
        };
        let number = |variable: &'static str| -> Result<Option<u64>, ConfigError> {
            text(variable)?
                .map(|value| match value.parse::<u64>() {
                    Ok(parsed) if parsed > 0 => Ok(parsed),
                    _ => Err(ConfigError::InvalidNumber { variable, value }),
                })
                .transpose()
        };
        let limit = |variable: &'static str, default: u32| -> Result<u32, ConfigError> {
            let Some(parsed) = number(variable)? else {
                return Ok(default);
            };
            u32::try_from(parsed).map_err(|_| ConfigError::InvalidNumber {
                variable,
                value: parsed.to_string(),
            })
        };

        let credentials = match (text("SPOTIFY_CLIENT_ID")?, text("SPOTIFY_CLIENT_SECRET")?) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    variable: "SPOTIFY_CLIENT_SECRET",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Missing {
                    variable: "SPOTIFY_CLIENT_ID",
                });
            }
        };

        Ok(Self {
            catalog_base_url: text("TUNESCOUT_CATALOG_BASE_URL")?
                .unwrap_or(defaults.catalog_base_url),
            token_url: text("TUNESCOUT_TOKEN_URL")?.unwrap_or(defaults.token_url),
            credentials,
            database_path: text("TUNESCOUT_DB_PATH")?
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            debounce: number("TUNESCOUT_DEBOUNCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            search_limit: limit("TUNESCOUT_SEARCH_LIMIT", defaults.search_limit)?,
            prefetch_limit: limit("TUNESCOUT_PREFETCH_LIMIT", defaults.prefetch_limit)?,
            http_timeout: number("TUNESCOUT_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        })
    }

    pub fn require_credentials(&self) -> Result<&ClientCredentials, ConfigError> {
        self.credentials.as_ref().ok_or(ConfigError::Missing {
            variable: "SPOTIFY_CLIENT_ID",
        })
    }
}
