//! Streams row changes of a Postgres logical replication slot to a message broker.
//!
//! The slot must use the `wal2json` output plugin. Every inserted row holding a topic column and
//! a payload column becomes one event, published with at-least-once delivery: a replication
//! position is acknowledged to the server only after the events of its payload were published.
//!
//! The entry point is [`listener::Listener`].

pub mod concurrency;
pub mod conversions;
pub mod delivery;
pub mod error;
pub mod listener;
mod macros;
pub mod metrics;
pub mod publisher;
pub mod replication;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
