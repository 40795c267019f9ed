//! Infrastructure layer: inventory persistence and database wiring.

pub mod config;
pub mod store;

pub use config::{DatabaseConfig, DbInitError, run_migrations};
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
