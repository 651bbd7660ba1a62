mod base;
mod connection;
mod delivery;
mod extraction;
mod listener;
mod metrics;
mod publisher;
mod replication;
mod sentry;

pub use base::*;
pub use connection::*;
pub use delivery::*;
pub use extraction::*;
pub use listener::*;
pub use metrics::*;
pub use publisher::*;
pub use replication::*;
pub use sentry::*;
