use async_trait::async_trait;

use pantry_core::{ItemId, Page, PageRequest, StockUpdateId, UserId};
use pantry_inventory::{
    Item, ItemFilter, ItemSort, StockUpdate, StockUpdateFilter, StockUpdateSort,
    StockUpdateWithItem,
};

/// Errors surfaced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness or optimistic-concurrency check failed at write time.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// The targeted row does not exist.
    #[error("row not found: {0}")]
    NotFound(String),

    /// The backend itself failed (lost connection, closed pool, corrupt row).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage contract for items and their stock-update history.
///
/// Items are ordinary mutable rows. Stock updates are append-only and carry
/// no foreign key back to items, so deleting an item leaves its history
/// behind.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert a freshly created item.
    ///
    /// Returns [`StoreError::Conflict`] when the owner already has an item
    /// with the same name.
    async fn insert_item(&self, item: &Item) -> Result<(), StoreError>;

    /// Fetch one item by id, regardless of owner.
    async fn fetch_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Fetch the item owned by `owner_id` whose name equals `name` exactly.
    async fn fetch_item_by_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> Result<Option<Item>, StoreError>;

    /// Overwrite an existing item row with the given state.
    ///
    /// Returns [`StoreError::NotFound`] when the row no longer exists and
    /// [`StoreError::Conflict`] when a rename collides with another of the
    /// owner's items.
    async fn update_item(&self, item: &Item) -> Result<(), StoreError>;

    /// Delete an item row. Its stock-update history is left untouched.
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;

    /// Page through one owner's items with filtering, search and sorting.
    async fn query_items(
        &self,
        owner_id: UserId,
        filter: &ItemFilter,
        sort: ItemSort,
        page: PageRequest,
    ) -> Result<Page<Item>, StoreError>;

    /// Atomically persist one audit row together with the adjusted item.
    ///
    /// The item write is conditional on the stored quantity still matching
    /// `update.old_quantity`. When that check fails the whole transaction
    /// rolls back, leaving no audit row, and the call returns
    /// [`StoreError::Conflict`].
    async fn record_adjustment(
        &self,
        update: &StockUpdate,
        updated_item: &Item,
    ) -> Result<(), StoreError>;

    /// Fetch one stock update joined with its item summary.
    ///
    /// The summary is `None` when the item has since been deleted.
    async fn fetch_stock_update(
        &self,
        id: StockUpdateId,
    ) -> Result<Option<StockUpdateWithItem>, StoreError>;

    /// Page through one owner's stock updates.
    async fn query_stock_updates(
        &self,
        owner_id: UserId,
        filter: &StockUpdateFilter,
        sort: StockUpdateSort,
        page: PageRequest,
    ) -> Result<Page<StockUpdateWithItem>, StoreError>;
}
