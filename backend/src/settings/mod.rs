//! Process configuration.
//!
//! Service wiring (ports, connection strings) comes from the environment via
//! [`service_settings_from_env`]; logging and health tuning are loaded with
//! OrthoConfig from `LOG_*` / `HEALTH_*` variables and config files.

mod health;
mod service;

pub use health::HealthSettings;
pub use service::{
    DatabasePoolSettings, Environment, ParseEnvironmentError, RedisSettings, ServiceSettings,
    SettingsError, service_settings_from_env,
};
