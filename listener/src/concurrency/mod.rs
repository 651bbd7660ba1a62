//! Coordination primitives shared by the listener tasks.

pub mod shutdown;
pub mod signal;
