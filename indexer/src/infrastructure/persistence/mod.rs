pub mod connection;
pub mod entities;
pub mod error;
pub mod factory;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DbPool;
pub use error::StoreError;
pub use factory::build_store;
pub use memory::MemoryStore;
pub use repositories::PostgresStore;
pub use store::DelegationStore;
