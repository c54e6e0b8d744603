//! Unit tests for service settings parsing.

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;

fn mock_env(vars: HashMap<&'static str, &'static str>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).map(|value| (*value).to_owned()));
    env
}

#[fixture]
fn minimal() -> HashMap<&'static str, &'static str> {
    HashMap::from([(DATABASE_URL_ENV, "postgres://localhost/auth")])
}

#[rstest]
fn defaults_apply_when_unset(minimal: HashMap<&'static str, &'static str>) {
    let settings = service_settings_from_env(&mock_env(minimal)).expect("settings load");

    assert_eq!(settings.service_name, "auth-backend");
    assert_eq!(settings.environment, Environment::Development);
    assert_eq!(settings.port, 3000);
    assert_eq!(settings.redis.url(), "redis://127.0.0.1:6379/0");
    assert_eq!(settings.database_pool, DatabasePoolSettings::default());
}

#[rstest]
fn overrides_are_respected(mut minimal: HashMap<&'static str, &'static str>) {
    minimal.extend([
        (APP_NAME_ENV, "identity"),
        (ENVIRONMENT_ENV, "Production"),
        (PORT_ENV, "8080"),
        (REDIS_HOST_ENV, "cache"),
        (REDIS_PORT_ENV, "6380"),
        (REDIS_PASSWORD_ENV, "pw"),
        (REDIS_DB_ENV, "3"),
        (DATABASE_POOL_SIZE_ENV, "25"),
        (DATABASE_POOL_TIMEOUT_MS_ENV, "1500"),
    ]);

    let settings = service_settings_from_env(&mock_env(minimal)).expect("settings load");

    assert_eq!(settings.service_name, "identity");
    assert!(settings.environment.is_production());
    assert_eq!(settings.port, 8080);
    assert_eq!(settings.redis.url(), "redis://:pw@cache:6380/3");
    assert_eq!(
        settings.database_pool,
        DatabasePoolSettings {
            max_size: 25,
            connection_timeout: Duration::from_millis(1500),
        }
    );
}

#[rstest]
fn service_name_takes_precedence_over_app_name(mut minimal: HashMap<&'static str, &'static str>) {
    minimal.extend([(APP_NAME_ENV, "app"), (SERVICE_NAME_ENV, "svc")]);
    let settings = service_settings_from_env(&mock_env(minimal)).expect("settings load");
    assert_eq!(settings.service_name, "svc");
}

#[rstest]
fn missing_database_url_is_rejected() {
    let result = service_settings_from_env(&mock_env(HashMap::new()));
    assert_eq!(
        result.err(),
        Some(SettingsError::MissingEnv {
            name: DATABASE_URL_ENV
        })
    );
}

#[rstest]
#[case(PORT_ENV, "http")]
#[case(REDIS_PORT_ENV, "70000")]
#[case(REDIS_DB_ENV, "-1")]
#[case(ENVIRONMENT_ENV, "staging")]
#[case(DATABASE_POOL_SIZE_ENV, "many")]
#[case(DATABASE_POOL_TIMEOUT_MS_ENV, "-5")]
fn malformed_values_are_rejected(
    mut minimal: HashMap<&'static str, &'static str>,
    #[case] name: &'static str,
    #[case] value: &'static str,
) {
    minimal.insert(name, value);
    let result = service_settings_from_env(&mock_env(minimal));
    assert!(matches!(
        result,
        Err(SettingsError::InvalidEnv { name: failed, .. }) if failed == name
    ));
}

#[rstest]
fn debug_output_redacts_the_database_url(minimal: HashMap<&'static str, &'static str>) {
    let settings = service_settings_from_env(&mock_env(minimal)).expect("settings load");
    assert!(!format!("{settings:?}").contains("postgres://"));
}

#[rstest]
#[case("production", Environment::Production)]
#[case(" Dev ", Environment::Development)]
#[case("TEST", Environment::Test)]
fn environment_names_parse(#[case] input: &str, #[case] expected: Environment) {
    assert_eq!(input.parse::<Environment>(), Ok(expected));
}

#[rstest]
fn unknown_environment_names_the_rejected_value() {
    let error = "staging".parse::<Environment>().expect_err("not an environment");

    assert_eq!(error.value(), "staging");
    assert_eq!(
        error.to_string(),
        "unknown environment \"staging\"; expected development|test|production"
    );
}
