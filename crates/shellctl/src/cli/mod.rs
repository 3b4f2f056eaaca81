//! Command implementations for the `shellctl` binary.

pub mod cluster;
pub mod config;
pub mod context;
pub mod lock;
pub mod output;
pub mod query;
