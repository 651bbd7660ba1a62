//! Configuration for the Postgres-to-broker listener.
//!
//! Provides runtime environment detection, layered loading from YAML files and `APP_` prefixed
//! environment variables, and the typed configuration consumed by the listener and its binary.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
