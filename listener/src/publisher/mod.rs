//! Publishers receiving the events extracted from the replication stream.

pub mod base;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
