use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio_postgres::types::PgLsn;

use crate::concurrency::shutdown::ShutdownTx;
use crate::error::{ErrorKind, ListenerError, ListenerResult};
use crate::listener_error;
use crate::replication::source::{ReplicationEvent, ReplicationSource};

/// Builds a keepalive event.
pub fn heartbeat(server_position: u64) -> ReplicationEvent {
    ReplicationEvent::Heartbeat {
        server_position: PgLsn::from(server_position),
    }
}

/// Builds a data message carrying `payload`.
pub fn data(payload: &str, start_position: u64, end_position: u64) -> ReplicationEvent {
    ReplicationEvent::Data {
        bytes: Bytes::copy_from_slice(payload.as_bytes()),
        start_position: PgLsn::from(start_position),
        end_position: PgLsn::from(end_position),
    }
}

#[derive(Debug)]
enum Step {
    Event(ReplicationEvent),
    Error(ListenerError),
}

#[derive(Debug, Default)]
struct Acks {
    sent: Vec<PgLsn>,
    attempts: usize,
}

/// [`ReplicationSource`] replaying a fixed script of events.
///
/// Once the script is exhausted the source either requests a shutdown, when built with
/// [`ScriptedSource::shutdown_when_exhausted`], or fails as a closed stream would.
#[derive(Debug)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    acks: Arc<Mutex<Acks>>,
    failing_acks: HashSet<usize>,
    shutdown_tx: Option<ShutdownTx>,
}

/// Read access to the acknowledgments of a [`ScriptedSource`] moved into a session.
#[derive(Debug, Clone)]
pub struct AckRecorder {
    acks: Arc<Mutex<Acks>>,
}

impl AckRecorder {
    /// Positions acknowledged successfully, in order.
    pub fn acknowledged(&self) -> Vec<PgLsn> {
        self.acks.lock().unwrap().sent.clone()
    }

    /// Number of acknowledgments attempted, failed ones included.
    pub fn attempts(&self) -> usize {
        self.acks.lock().unwrap().attempts
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            acks: Arc::new(Mutex::new(Acks::default())),
            failing_acks: HashSet::new(),
            shutdown_tx: None,
        }
    }

    pub fn event(mut self, event: ReplicationEvent) -> Self {
        self.steps.push_back(Step::Event(event));
        self
    }

    /// Makes the source return `error` once the preceding events have been consumed.
    pub fn error(mut self, error: ListenerError) -> Self {
        self.steps.push_back(Step::Error(error));
        self
    }

    /// Makes the acknowledgment attempt number `index` (starting at 0) fail.
    pub fn fail_ack(mut self, index: usize) -> Self {
        self.failing_acks.insert(index);
        self
    }

    pub fn shutdown_when_exhausted(mut self, shutdown_tx: ShutdownTx) -> Self {
        self.shutdown_tx = Some(shutdown_tx);
        self
    }

    pub fn ack_recorder(&self) -> AckRecorder {
        AckRecorder {
            acks: self.acks.clone(),
        }
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationSource for ScriptedSource {
    async fn next_event(&mut self) -> ListenerResult<ReplicationEvent> {
        match self.steps.pop_front() {
            Some(Step::Event(event)) => Ok(event),
            Some(Step::Error(error)) => Err(error),
            None => match &self.shutdown_tx {
                Some(shutdown_tx) => {
                    let _ = shutdown_tx.shutdown();
                    std::future::pending().await
                }
                None => Err(listener_error!(
                    ErrorKind::ReplicationStreamEnded,
                    "Scripted replication stream is exhausted"
                )),
            },
        }
    }

    async fn send_acknowledgment(&mut self, position: PgLsn) -> ListenerResult<()> {
        let mut acks = self.acks.lock().unwrap();
        let attempt = acks.attempts;
        acks.attempts += 1;

        if self.failing_acks.contains(&attempt) {
            return Err(listener_error!(
                ErrorKind::AcknowledgmentFailed,
                "Scripted acknowledgment failure",
                position
            ));
        }

        acks.sent.push(position);

        Ok(())
    }
}
