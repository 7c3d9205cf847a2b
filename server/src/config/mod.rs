use std::env;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::SecurityHeadersLayer;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3001));
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACCESS_TTL_SECS: u64 = 30 * 60;
const DEFAULT_REFRESH_TTL_SECS: u64 = 24 * 60 * 60;
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const DEV_JWT_SECRET: &str = "hanbok-dev-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Superuser created at startup when no account with `email` exists yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub storage: StorageBackend,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub admin: Option<AdminSeed>,
    pub cors_allowed_origins: Option<String>,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let production = get("RUST_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let database_url = get("DATABASE_URL");
        let storage = match get("STORAGE_BACKEND") {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "postgres" => StorageBackend::Postgres,
                "memory" => StorageBackend::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "STORAGE_BACKEND",
                        value,
                        reason: "expected 'postgres' or 'memory'".to_string(),
                    })
                }
            },
            None if database_url.is_some() => StorageBackend::Postgres,
            None => StorageBackend::Memory,
        };
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            get("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR)?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                tracing::warn!("JWT_SECRET is not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let access_secs = token_ttl(
            "ACCESS_TOKEN_TTL_SECS",
            get("ACCESS_TOKEN_TTL_SECS"),
            DEFAULT_ACCESS_TTL_SECS,
        )?;
        let refresh_secs = token_ttl(
            "REFRESH_TOKEN_TTL_SECS",
            get("REFRESH_TOKEN_TTL_SECS"),
            DEFAULT_REFRESH_TTL_SECS,
        )?;

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => {
                let username = get("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string());
                Some(AdminSeed {
                    email,
                    username,
                    password,
                })
            }
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
            (None, None) => None,
        };

        Ok(Self {
            database_url,
            storage,
            max_connections,
            bind_addr,
            jwt_secret,
            access_token_ttl: Duration::from_secs(access_secs),
            refresh_token_ttl: Duration::from_secs(refresh_secs),
            admin,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
            production,
        })
    }
}

fn token_ttl(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let secs = parse_or(name, raw, default)?;
    if secs == 0 || secs > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
            reason: format!("must be between 1 and {} seconds", MAX_TOKEN_TTL_SECS),
        });
    }
    Ok(secs)
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
