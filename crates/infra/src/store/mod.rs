//! Storage boundary for items and their stock-update history.
//!
//! This module defines the persistence contract the services program against,
//! plus the Postgres implementation used in production and an in-memory
//! implementation used by tests.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use r#trait::{InventoryStore, StoreError};
