//! Inventory domain module.
//!
//! This crate contains business rules for pantry items and their stock-update
//! audit trail, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod item;
pub mod query;
pub mod stock_update;

pub use item::{Category, Item, ItemPatch, NewItem, StockLevel, Unit};
pub use query::{
    ItemFilter, ItemSort, ItemSortKey, Sort, StockUpdateFilter, StockUpdateSort, StockUpdateSortKey,
};
pub use stock_update::{ItemSummary, StockAdjustment, StockUpdate, StockUpdateWithItem};
