//! Item CRUD orchestration: validation, ownership, uniqueness, persistence.

use std::sync::Arc;

use chrono::Utc;

use pantry_core::{DomainError, ItemId, Page, PageRequest, UserId};
use pantry_inventory::{Item, ItemFilter, ItemPatch, ItemSort, NewItem};

use crate::store::InventoryStore;

use super::ServiceResult;

/// Orchestrates item operations against the store.
///
/// Ownership is enforced here: point reads fetch by id and then compare
/// `owner_id`, so a missing item reads as `NotFound` and a foreign one as
/// `Forbidden`.
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn InventoryStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Create an item for `owner_id`, rejecting duplicate names.
    pub async fn create_item(
        &self,
        new_item: NewItem,
        owner_id: UserId,
        actor: &str,
    ) -> ServiceResult<Item> {
        let item = Item::create(new_item, owner_id, actor, Utc::now())?;

        if self
            .store
            .fetch_item_by_name(owner_id, &item.name)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict("Item with this name already exists").into());
        }

        self.store.insert_item(&item).await?;
        Ok(item)
    }

    /// Fetch one item, enforcing ownership.
    pub async fn get_item(&self, id: ItemId, owner_id: UserId) -> ServiceResult<Item> {
        let item = self
            .store
            .fetch_item(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Item not found"))?;

        if item.owner_id != owner_id {
            return Err(DomainError::forbidden("Not authorized to access this item").into());
        }

        Ok(item)
    }

    /// Page through the owner's items.
    pub async fn list_items(
        &self,
        owner_id: UserId,
        filter: &ItemFilter,
        sort: ItemSort,
        page: PageRequest,
    ) -> ServiceResult<Page<Item>> {
        Ok(self.store.query_items(owner_id, filter, sort, page).await?)
    }

    /// Apply a partial update, re-deriving the stock level from the merged
    /// quantity and minimum.
    ///
    /// The patch is validated before the item is looked up, so an empty or
    /// malformed patch fails the same way whether or not the item exists.
    pub async fn update_item(
        &self,
        id: ItemId,
        patch: ItemPatch,
        owner_id: UserId,
        actor: &str,
    ) -> ServiceResult<Item> {
        patch.validate()?;

        let mut item = self.get_item(id, owner_id).await?;

        if let Some(new_name) = &patch.name {
            if *new_name != item.name {
                let existing = self.store.fetch_item_by_name(owner_id, new_name).await?;
                if existing.is_some_and(|other| other.id != id) {
                    return Err(
                        DomainError::conflict("Item with this name already exists").into()
                    );
                }
            }
        }

        item.apply_patch(patch, actor, Utc::now())?;
        self.store.update_item(&item).await?;
        Ok(item)
    }

    /// Delete an item, returning its final state. History rows stay behind.
    pub async fn delete_item(&self, id: ItemId, owner_id: UserId) -> ServiceResult<Item> {
        let item = self.get_item(id, owner_id).await?;
        self.store.delete_item(id).await?;
        Ok(item)
    }
}
