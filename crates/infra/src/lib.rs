//! Infrastructure layer: storage adapters and the services built on them.

pub mod service;
pub mod store;

pub use service::{ItemService, ServiceError, ServiceResult, StockUpdateService};
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
