use std::pin::Pin;
use std::sync::LazyLock;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use postgres_replication::ReplicationStream;
use postgres_replication::protocol::ReplicationMessage;
use tokio_postgres::types::PgLsn;
use tracing::{debug, warn};

use crate::error::{ErrorKind, ListenerResult};
use crate::listener_error;
use crate::replication::source::{ReplicationEvent, ReplicationSource};

const SECONDS_FROM_UNIX_EPOCH_TO_2000: u64 = 946_684_800;

/// Midnight of 2000-01-01, the reference point of Postgres timestamps.
static POSTGRES_EPOCH: LazyLock<SystemTime> =
    LazyLock::new(|| UNIX_EPOCH + Duration::from_secs(SECONDS_FROM_UNIX_EPOCH_TO_2000));

pin_project! {
    /// Replication messages of a `START_REPLICATION` copy stream.
    #[must_use = "streams do nothing unless polled"]
    pub struct EventsStream {
        #[pin]
        stream: ReplicationStream,
    }
}

impl EventsStream {
    pub fn wrap(stream: ReplicationStream) -> Self {
        Self { stream }
    }

    /// Sends a standby status update with `position` as the written, flushed and applied position.
    pub async fn send_status_update(self: Pin<&mut Self>, position: PgLsn) -> ListenerResult<()> {
        let this = self.project();

        // Microseconds since midnight on 2000-01-01 as seen by the client.
        let ts = POSTGRES_EPOCH
            .elapsed()
            .map_err(|e| {
                listener_error!(
                    ErrorKind::InvalidState,
                    "Invalid Postgres epoch",
                    e.to_string()
                )
            })?
            .as_micros() as i64;

        this.stream
            .standby_status_update(position, position, position, ts, 0)
            .await?;

        debug!(%position, "status update sent");

        Ok(())
    }
}

impl Stream for EventsStream {
    type Item = ListenerResult<ReplicationMessage<Bytes>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.stream.poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(Err(err.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// [`ReplicationSource`] backed by a Postgres replication connection.
pub struct PgReplicationSource {
    stream: Pin<Box<EventsStream>>,
}

impl PgReplicationSource {
    pub fn new(stream: EventsStream) -> Self {
        Self {
            stream: Box::pin(stream),
        }
    }
}

impl ReplicationSource for PgReplicationSource {
    async fn next_event(&mut self) -> ListenerResult<ReplicationEvent> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Err(listener_error!(
                    ErrorKind::ReplicationStreamEnded,
                    "Replication stream was closed by the server"
                ));
            };

            match message? {
                ReplicationMessage::XLogData(body) => {
                    let start_position = PgLsn::from(body.wal_start());
                    let end_position = PgLsn::from(body.wal_end());

                    return Ok(ReplicationEvent::Data {
                        bytes: body.into_data(),
                        start_position,
                        end_position,
                    });
                }
                ReplicationMessage::PrimaryKeepAlive(body) => {
                    return Ok(ReplicationEvent::Heartbeat {
                        server_position: PgLsn::from(body.wal_end()),
                    });
                }
                _ => {
                    warn!("skipping unsupported replication message");
                }
            }
        }
    }

    async fn send_acknowledgment(&mut self, position: PgLsn) -> ListenerResult<()> {
        self.stream.as_mut().send_status_update(position).await
    }
}
