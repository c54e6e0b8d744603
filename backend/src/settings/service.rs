//! Environment-driven service settings.
//!
//! Values are read through the [`mockable::Env`] seam so parsing can be
//! exercised without touching the process environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use mockable::Env;

pub const APP_NAME_ENV: &str = "APP_NAME";
pub const SERVICE_NAME_ENV: &str = "SERVICE_NAME";
pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";
pub const PORT_ENV: &str = "BACKEND_PORT";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const REDIS_HOST_ENV: &str = "REDIS_HOST";
pub const REDIS_PORT_ENV: &str = "REDIS_PORT";
pub const REDIS_PASSWORD_ENV: &str = "REDIS_PASSWORD";
pub const REDIS_DB_ENV: &str = "REDIS_DB";
pub const DATABASE_POOL_SIZE_ENV: &str = "DATABASE_POOL_SIZE";
pub const DATABASE_POOL_TIMEOUT_MS_ENV: &str = "DATABASE_POOL_TIMEOUT_MS";

const DEFAULT_SERVICE_NAME: &str = "auth-backend";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_POOL_TIMEOUT_MS: u64 = 30_000;
const ENVIRONMENT_EXPECTED: &str = "development|test|production";

/// Errors raised while reading service settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required variable is absent or blank.
    #[error("{name} must be set")]
    MissingEnv { name: &'static str },
    /// A variable holds a value that cannot be parsed.
    #[error("invalid {name}={value}; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Lowercase name stamped on log records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    #[must_use]
    pub fn is_test(self) -> bool {
        self == Self::Test
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string names no [`Environment`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment {value:?}; expected {}", ENVIRONMENT_EXPECTED)]
pub struct ParseEnvironmentError {
    value: String,
}

impl ParseEnvironmentError {
    /// The rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ParseEnvironmentError {
                value: value.to_owned(),
            }),
        }
    }
}

/// Connection parameters for the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: u32,
}

impl RedisSettings {
    /// `redis://` URL understood by the Redis client.
    ///
    /// # Examples
    /// ```
    /// use auth_backend::settings::RedisSettings;
    ///
    /// let settings = RedisSettings {
    ///     host: "cache".to_owned(),
    ///     port: 6380,
    ///     password: Some("s3cret".to_owned()),
    ///     db: 2,
    /// };
    /// assert_eq!(settings.url(), "redis://:s3cret@cache:6380/2");
    /// ```
    #[must_use]
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{password}@{}:{}/{}",
                self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// Sizing of the shared database pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabasePoolSettings {
    pub max_size: u32,
    pub connection_timeout: Duration,
}

impl Default for DatabasePoolSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_millis(DEFAULT_POOL_TIMEOUT_MS),
        }
    }
}

/// Settings needed to start the service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub service_name: String,
    pub environment: Environment,
    pub port: u16,
    pub database_url: String,
    pub database_pool: DatabasePoolSettings,
    pub redis: RedisSettings,
}

impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("service_name", &self.service_name)
            .field("environment", &self.environment)
            .field("port", &self.port)
            .field("database_url", &"<redacted>")
            .field("database_pool", &self.database_pool)
            .field("redis_host", &self.redis.host)
            .field("redis_port", &self.redis.port)
            .finish_non_exhaustive()
    }
}

/// Read [`ServiceSettings`] from `env`.
///
/// # Examples
/// ```
/// use auth_backend::settings::{service_settings_from_env, Environment};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "DATABASE_URL" => Some("postgres://localhost/auth".to_owned()),
///     "ENVIRONMENT" => Some("production".to_owned()),
///     _ => None,
/// });
///
/// let settings = service_settings_from_env(&env).expect("valid settings");
/// assert_eq!(settings.environment, Environment::Production);
/// assert_eq!(settings.port, 3000);
/// ```
///
/// # Errors
/// Returns [`SettingsError`] when `DATABASE_URL` is missing or a value is
/// malformed.
pub fn service_settings_from_env<E: Env>(env: &E) -> Result<ServiceSettings, SettingsError> {
    let service_name = non_blank(env, SERVICE_NAME_ENV)
        .or_else(|| non_blank(env, APP_NAME_ENV))
        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_owned());

    let environment = match non_blank(env, ENVIRONMENT_ENV) {
        Some(value) => value
            .parse()
            .map_err(|error: ParseEnvironmentError| SettingsError::InvalidEnv {
                name: ENVIRONMENT_ENV,
                value: error.value,
                expected: ENVIRONMENT_EXPECTED,
            })?,
        None => Environment::default(),
    };

    let database_url = non_blank(env, DATABASE_URL_ENV).ok_or(SettingsError::MissingEnv {
        name: DATABASE_URL_ENV,
    })?;

    Ok(ServiceSettings {
        service_name,
        environment,
        port: parse_or(env, PORT_ENV, DEFAULT_PORT, "a port number")?,
        database_url,
        database_pool: DatabasePoolSettings {
            max_size: parse_or(env, DATABASE_POOL_SIZE_ENV, DEFAULT_POOL_SIZE, "a pool size")?,
            connection_timeout: Duration::from_millis(parse_or(
                env,
                DATABASE_POOL_TIMEOUT_MS_ENV,
                DEFAULT_POOL_TIMEOUT_MS,
                "milliseconds",
            )?),
        },
        redis: RedisSettings {
            host: non_blank(env, REDIS_HOST_ENV).unwrap_or_else(|| DEFAULT_REDIS_HOST.to_owned()),
            port: parse_or(env, REDIS_PORT_ENV, DEFAULT_REDIS_PORT, "a port number")?,
            password: non_blank(env, REDIS_PASSWORD_ENV),
            db: parse_or(env, REDIS_DB_ENV, 0, "a database index")?,
        },
    })
}

fn non_blank<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name).filter(|value| !value.trim().is_empty())
}

fn parse_or<E: Env, T: FromStr>(
    env: &E,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, SettingsError> {
    match non_blank(env, name) {
        Some(value) => value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
            name,
            value,
            expected,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests;
