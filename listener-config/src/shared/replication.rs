use serde::Deserialize;

/// The position the replication starts from when none is configured: the beginning of the log.
pub const DEFAULT_START_LSN: &str = "0/0";

/// Settings of the logical replication session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplicationConfig {
    /// Name of an existing logical replication slot created with the `wal2json` plugin.
    pub slot_name: String,
    /// Position to start streaming from, in the Postgres `X/Y` text form.
    #[serde(default)]
    pub start_lsn: Option<String>,
    /// Comma separated `schema.table` filter, passed as the `add-tables` plugin option.
    #[serde(default)]
    pub table_names: Option<String>,
    /// Whether the plugin should split large change sets over several messages
    /// (`write-in-chunks` option).
    #[serde(default)]
    pub write_in_chunks: Option<bool>,
}

impl ReplicationConfig {
    /// Returns the configured start position, or [`DEFAULT_START_LSN`].
    pub fn start_lsn(&self) -> &str {
        self.start_lsn
            .as_deref()
            .filter(|lsn| !lsn.is_empty())
            .unwrap_or(DEFAULT_START_LSN)
    }
}
