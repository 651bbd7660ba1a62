use listener_config::shared::{PgConnectionConfig, ReplicationConfig};
use pg_escape::{quote_identifier, quote_literal};
use postgres_replication::ReplicationStream;
use tokio_postgres::config::ReplicationMode;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::types::PgLsn;
use tokio_postgres::{Client, Config, Connection, NoTls, Socket};
use tracing::{Instrument, error, info};

use crate::error::ListenerResult;
use crate::replication::stream::{EventsStream, PgReplicationSource};

/// Spawns a background task driving a Postgres connection until it terminates.
fn spawn_postgres_connection<T>(connection: Connection<Socket, T::Stream>)
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let span = tracing::Span::current();
    let task = async move {
        if let Err(e) = connection.await {
            error!("an error occurred during the Postgres connection: {}", e);
            return;
        }

        info!("postgres connection terminated successfully")
    }
    .instrument(span);

    tokio::spawn(task);
}

/// Output plugin options sent with `START_REPLICATION`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationOptions {
    /// Value of the wal2json `add-tables` option.
    pub table_names: Option<String>,
    /// Value of the wal2json `write-in-chunks` option.
    pub write_in_chunks: Option<bool>,
}

impl From<&ReplicationConfig> for ReplicationOptions {
    fn from(config: &ReplicationConfig) -> Self {
        Self {
            table_names: config
                .table_names
                .clone()
                .filter(|table_names| !table_names.is_empty()),
            write_in_chunks: config.write_in_chunks,
        }
    }
}

impl ReplicationOptions {
    fn to_sql(&self) -> Option<String> {
        let mut params = Vec::new();

        if let Some(table_names) = &self.table_names {
            params.push(format!(r#""add-tables" {}"#, quote_literal(table_names)));
        }
        if let Some(write_in_chunks) = self.write_in_chunks {
            let value = if write_in_chunks { "1" } else { "0" };
            params.push(format!(r#""write-in-chunks" '{value}'"#));
        }

        if params.is_empty() {
            None
        } else {
            Some(format!("({})", params.join(", ")))
        }
    }
}

/// Builds the `START_REPLICATION` command of a logical slot.
pub fn start_replication_query(
    slot_name: &str,
    start_lsn: PgLsn,
    options: &ReplicationOptions,
) -> String {
    // The options are case sensitive and must not be lowercased.
    let query = format!(
        "START_REPLICATION SLOT {} LOGICAL {}",
        quote_identifier(slot_name),
        start_lsn
    );

    match options.to_sql() {
        Some(options) => format!("{query} {options}"),
        None => query,
    }
}

/// A client connected to Postgres in logical replication mode.
#[derive(Debug)]
pub struct PgReplicationClient {
    client: Client,
}

impl PgReplicationClient {
    /// Connects to the database of `pg_connection_config` with `replication=database`.
    pub async fn connect(pg_connection_config: &PgConnectionConfig) -> ListenerResult<Self> {
        let mut config: Config = pg_connection_config.to_connect_options();
        config.replication_mode(ReplicationMode::Logical);

        let (client, connection) = config.connect(NoTls).await?;
        spawn_postgres_connection::<NoTls>(connection);

        info!(
            host = %pg_connection_config.host,
            port = pg_connection_config.port,
            database = %pg_connection_config.name,
            "successfully connected to postgres"
        );

        Ok(PgReplicationClient { client })
    }

    /// Starts streaming the changes of `slot_name` from `start_lsn`.
    ///
    /// The client is consumed since a connection in copy-both mode cannot run other commands.
    pub async fn start_replication(
        self,
        slot_name: &str,
        start_lsn: PgLsn,
        options: &ReplicationOptions,
    ) -> ListenerResult<PgReplicationSource> {
        info!(
            slot_name,
            %start_lsn,
            table_names = options.table_names.as_deref(),
            write_in_chunks = options.write_in_chunks,
            "starting logical replication"
        );

        let query = start_replication_query(slot_name, start_lsn, options);
        let copy_stream = self.client.copy_both_simple::<bytes::Bytes>(&query).await?;
        let stream = EventsStream::wrap(ReplicationStream::new(copy_stream));

        Ok(PgReplicationSource::new(stream))
    }
}
