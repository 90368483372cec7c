//! Process configuration, read from the environment once at start-up.

use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub debug_mode: bool,
    pub allowed_origins: Vec<String>,
    pub skip_migrations: bool,
    pub db_max_connections: u32,
    /// Base for relative image paths stored in the url columns
    pub media_base_url: Option<url::Url>,
    pub query_timeout: Duration,
    /// Extra attempts after a transient store error
    pub store_retries: u32,
    pub fallback_concurrency: usize,
    pub remember_primary_unavailable: bool,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            debug_mode: false,
            allowed_origins: Vec::new(),
            skip_migrations: false,
            db_max_connections: 32,
            media_base_url: None,
            query_timeout: Duration::from_millis(3000),
            store_retries: 1,
            fallback_concurrency: 4,
            remember_primary_unavailable: true,
            default_page_size: 24,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Build from the process environment (after `dotenvy` has loaded `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` is the production caller.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let media_base_url = match lookup("MEDIA_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(url::Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid {
                name: "MEDIA_BASE_URL",
                value: raw.clone(),
            })?),
            None => None,
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let timeout_ms: u64 = parse_var(&lookup, "QUERY_TIMEOUT_MS", 3000)?;
        let fallback_concurrency: usize =
            parse_var(&lookup, "FALLBACK_CONCURRENCY", defaults.fallback_concurrency)?;
        if fallback_concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "FALLBACK_CONCURRENCY",
                value: "0".to_string(),
            });
        }

        // Transient failures get at most one retry
        let store_retries: u32 = parse_var(&lookup, "STORE_RETRIES", defaults.store_retries)?;
        if store_retries > 1 {
            return Err(ConfigError::Invalid {
                name: "STORE_RETRIES",
                value: store_retries.to_string(),
            });
        }

        let default_page_size = parse_var(&lookup, "DEFAULT_PAGE_SIZE", defaults.default_page_size)?;
        let max_page_size = parse_var(&lookup, "MAX_PAGE_SIZE", defaults.max_page_size)?;
        if default_page_size < 0 || max_page_size < default_page_size {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_PAGE_SIZE",
                value: default_page_size.to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            debug_mode: parse_flag(&lookup, "DEBUG_MODE", defaults.debug_mode),
            allowed_origins,
            skip_migrations: parse_flag(&lookup, "SKIP_MIGRATIONS", defaults.skip_migrations),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            media_base_url,
            query_timeout: Duration::from_millis(timeout_ms),
            store_retries,
            fallback_concurrency,
            remember_primary_unavailable: parse_flag(
                &lookup,
                "REMEMBER_PRIMARY_UNAVAILABLE",
                defaults.remember_primary_unavailable,
            ),
            default_page_size,
            max_page_size,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}
