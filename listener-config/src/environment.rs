use std::fmt;
use std::io::Error;
use std::str::FromStr;

/// Environment variable holding the name of the runtime environment.
const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

/// Runtime environment of the listener.
///
/// Selects the environment specific configuration file and the logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Prod,
    Staging,
    Dev,
}

impl Environment {
    /// Reads the environment from `APP_ENVIRONMENT`, falling back to [`Environment::Prod`].
    pub fn load() -> Result<Environment, Error> {
        match std::env::var(APP_ENVIRONMENT_ENV_NAME) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::Prod),
        }
    }

    /// Exports this environment through `APP_ENVIRONMENT`.
    ///
    /// Only meant for single threaded setup code such as test initialization.
    pub fn set(&self) {
        unsafe { std::env::set_var(APP_ENVIRONMENT_ENV_NAME, self.as_str()) }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Staging => "staging",
            Environment::Dev => "dev",
        }
    }

    /// Name of the YAML file holding the settings specific to this environment.
    pub fn config_file_name(&self) -> String {
        format!("{}.yaml", self.as_str())
    }

    /// Returns `true` for environments which log structured output to files.
    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod | Self::Staging)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        [Environment::Prod, Environment::Staging, Environment::Dev]
            .into_iter()
            .find(|environment| environment.as_str() == normalized)
            .ok_or_else(|| {
                Error::other(format!(
                    "`{s}` is not a supported environment, expected one of `prod`, `staging` or `dev`"
                ))
            })
    }
}
