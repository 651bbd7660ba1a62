//! Top level orchestration of a replication session.
//!
//! A [`Listener`] validates its configuration, connects to Postgres, starts streaming from the
//! configured slot and runs the [`ReplicationSession`] until it fails or is shut down.

use std::sync::Arc;

use listener_config::shared::ListenerConfig;
use tokio_postgres::types::PgLsn;
use tracing::{error, info};

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::conversions::extract::ChangeExtractor;
use crate::delivery::DeliveryCoordinator;
use crate::error::{ErrorKind, ListenerError, ListenerResult};
use crate::listener_error;
use crate::metrics::{SessionMetrics, register_metrics};
use crate::publisher::base::EventPublisher;
use crate::replication::client::{PgReplicationClient, ReplicationOptions};
use crate::replication::session::ReplicationSession;
use crate::replication::source::ReplicationSource;
use crate::replication::stream::PgReplicationSource;

/// Lifecycle of a [`Listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Not started yet, or setting up the replication connection.
    Connecting,
    /// Streaming changes.
    Replicating,
    /// Stopped after a shutdown request.
    Stopped,
    /// Stopped after an error. Terminal.
    Failed,
}

/// Streams the changes of a logical replication slot to an [`EventPublisher`].
#[derive(Debug)]
pub struct Listener<P> {
    config: Arc<ListenerConfig>,
    publisher: P,
    metrics: Arc<SessionMetrics>,
    state: ListenerState,
    shutdown_tx: ShutdownTx,
    // Kept so a shutdown requested before the session starts is not lost.
    shutdown_rx: ShutdownRx,
}

impl<P> Listener<P>
where
    P: EventPublisher + Clone,
{
    pub fn new(config: ListenerConfig, publisher: P) -> Self {
        // Describing metrics more than once is a no-op.
        register_metrics();
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        Self {
            config: Arc::new(config),
            publisher,
            metrics: Arc::new(SessionMetrics::new()),
            state: ListenerState::Connecting,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Returns a handle to request a graceful stop of [`Listener::run`].
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Counters of the session, readable while it runs.
    pub fn metrics(&self) -> Arc<SessionMetrics> {
        self.metrics.clone()
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Connects to Postgres and replicates until a shutdown is requested.
    ///
    /// Returns `Ok(())` only for a graceful shutdown. Errors are not retried, restarting the
    /// listener is left to the process supervisor.
    pub async fn run(&mut self) -> ListenerResult<()> {
        self.state = ListenerState::Connecting;
        info!(
            slot_name = %self.config.replication.slot_name,
            "starting listener"
        );

        let start_lsn = match self.prepare() {
            Ok(start_lsn) => start_lsn,
            Err(err) => return Err(self.fail(err)),
        };

        let replication_options = ReplicationOptions::from(&self.config.replication);
        let mut shutdown_rx = self.shutdown_rx.clone();
        let connected = tokio::select! {
            biased;

            _ = shutdown_rx.changed() => None,
            source = self.connect(start_lsn, &replication_options) => Some(source),
        };

        let source = match connected {
            Some(Ok(source)) => source,
            Some(Err(err)) => return Err(self.fail(err)),
            None => {
                self.state = ListenerState::Stopped;
                info!("listener stopped before replication started");

                return Ok(());
            }
        };

        self.replicate(source, start_lsn).await
    }

    /// Runs the replication session on an already started `source`.
    pub async fn replicate<S>(&mut self, source: S, start_lsn: PgLsn) -> ListenerResult<()>
    where
        S: ReplicationSource,
    {
        self.state = ListenerState::Replicating;

        let delivery = DeliveryCoordinator::new(
            self.publisher.clone(),
            self.config.delivery.retry_delay(),
            self.metrics.clone(),
        );
        let session = ReplicationSession::new(
            source,
            start_lsn,
            ChangeExtractor::from(&self.config.extraction),
            delivery,
            self.metrics.clone(),
            self.shutdown_rx.clone(),
        );

        match session.run().await {
            Ok(()) => {
                self.state = ListenerState::Stopped;
                info!("listener stopped");

                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn prepare(&self) -> ListenerResult<PgLsn> {
        self.config.validate().map_err(|err| {
            listener_error!(ErrorKind::ConfigError, "Invalid listener configuration", err)
        })?;

        parse_start_lsn(self.config.replication.start_lsn())
    }

    async fn connect(
        &self,
        start_lsn: PgLsn,
        options: &ReplicationOptions,
    ) -> ListenerResult<PgReplicationSource> {
        let client = PgReplicationClient::connect(&self.config.pg_connection).await?;

        client
            .start_replication(&self.config.replication.slot_name, start_lsn, options)
            .await
    }

    fn fail(&mut self, err: ListenerError) -> ListenerError {
        self.state = ListenerState::Failed;
        error!(state = ?self.state, error = %err, "listener failed");

        err
    }
}

/// Parses a position in the Postgres `X/Y` text form.
pub fn parse_start_lsn(lsn: &str) -> ListenerResult<PgLsn> {
    lsn.parse::<PgLsn>().map_err(|_| {
        listener_error!(
            ErrorKind::ConfigError,
            "Invalid replication start position",
            format!("'{lsn}' is not a valid LSN")
        )
    })
}
