use std::path::Path;

use serde::de::DeserializeOwned;

use crate::environment::Environment;

/// Directory, relative to the working directory, holding the configuration files.
const CONFIGURATION_DIR: &str = "configuration";

/// File loaded for every environment before the environment specific one.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix of environment variable overrides, e.g. `APP_REPLICATION__SLOT_NAME`.
const ENV_PREFIX: &str = "APP";

const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator between nested keys: `APP_PG_CONNECTION__HOST` sets `pg_connection.host`.
const ENV_SEPARATOR: &str = "__";

/// Separator between list elements: `APP_PUBLISHER__KAFKA__BROKERS=a:9092,b:9092`.
const LIST_SEPARATOR: &str = ",";

/// Implemented by top level configuration types to declare which keys hold lists.
pub trait Config {
    /// Keys whose environment variable values are split on `,` into lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Loads `T` from the `configuration` directory of the current working directory.
///
/// Sources are layered in this order, later ones overriding earlier ones:
/// 1. `configuration/base.yaml`
/// 2. `configuration/{environment}.yaml`, with the environment taken from `APP_ENVIRONMENT`
/// 3. `APP_` prefixed environment variables
pub fn load_config<T>() -> Result<T, config::ConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(|err| {
        config::ConfigError::Message(format!("failed to determine the current directory: {err}"))
    })?;
    let environment =
        Environment::load().map_err(|err| config::ConfigError::Message(err.to_string()))?;

    load_config_from(&base_path.join(CONFIGURATION_DIR), environment)
}

/// Loads `T` from the given configuration directory for an explicit environment.
pub fn load_config_from<T>(
    configuration_directory: &Path,
    environment: Environment,
) -> Result<T, config::ConfigError>
where
    T: Config + DeserializeOwned,
{
    let mut environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    if !T::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR);

        for key in T::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join(BASE_CONFIG_FILE),
        ))
        .add_source(
            config::File::from(configuration_directory.join(environment.config_file_name()))
                .required(false),
        )
        .add_source(environment_source)
        .build()?
        .try_deserialize::<T>()
}
