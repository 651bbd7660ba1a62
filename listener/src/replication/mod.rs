//! Postgres logical replication session handling.
//!
//! Connects to Postgres in replication mode, streams wal2json payloads and drives the session loop
//! that turns them into published events while acknowledging progress back to the server.

pub mod client;
pub mod position;
pub mod session;
pub mod source;
pub mod stream;
