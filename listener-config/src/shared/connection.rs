use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio_postgres::Config as TokioPgConnectOptions;

/// Connection parameters of the Postgres server to replicate from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PgConnectionConfig {
    /// Hostname or IP address of the Postgres server.
    pub host: String,
    /// Port on which the Postgres server is listening.
    pub port: u16,
    /// Name of the database holding the replication slot.
    pub name: String,
    /// User with the `REPLICATION` attribute.
    pub username: String,
    /// Password of [`PgConnectionConfig::username`], redacted in debug output.
    #[serde(default)]
    pub password: Option<SecretString>,
}

impl PgConnectionConfig {
    /// Builds `tokio-postgres` connect options targeting [`PgConnectionConfig::name`].
    pub fn to_connect_options(&self) -> TokioPgConnectOptions {
        let mut options = TokioPgConnectOptions::new();
        options
            .host(&self.host)
            .port(self.port)
            .user(&self.username)
            .dbname(&self.name);

        if let Some(password) = &self.password {
            options.password(password.expose_secret());
        }

        options
    }
}
