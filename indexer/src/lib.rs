//! Tezos delegation indexer.
//!
//! The library is shared by the job process (this crate's binary) and the
//! query API process. It holds the upstream client, the store, the telemetry
//! decorators, the sync engine and its poller, plus the configuration,
//! logging and health plumbing both processes need.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod utils;
