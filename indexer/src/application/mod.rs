//! Ingestion: the dual-mode sync engine and the poller driving it

pub mod poller;
pub mod sync;

pub use poller::Poller;
pub use sync::{DelegationSyncer, SyncMode, SyncReport, SyncSettings};
