//! Stock-adjustment orchestration: one audit row plus the item it updates.

use std::sync::Arc;

use chrono::Utc;

use pantry_core::{DomainError, ItemId, Page, PageRequest, StockUpdateId, UserId};
use pantry_inventory::{
    StockAdjustment, StockUpdate, StockUpdateFilter, StockUpdateSort, StockUpdateWithItem,
};

use crate::store::{InventoryStore, StoreError};

use super::{ServiceError, ServiceResult};

/// Orchestrates stock adjustments and history reads.
#[derive(Clone)]
pub struct StockUpdateService {
    store: Arc<dyn InventoryStore>,
}

impl StockUpdateService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Commit one stock adjustment.
    ///
    /// Checks run in order: payload validation, item existence, ownership,
    /// then the old-quantity claim. The claim is re-checked inside the store
    /// transaction, so an adjustment that lands mid-flight still surfaces as
    /// a conflict instead of a lost update.
    pub async fn adjust_stock(
        &self,
        adjustment: StockAdjustment,
        owner_id: UserId,
        actor: &str,
    ) -> ServiceResult<StockUpdate> {
        adjustment.validate()?;

        let item = self
            .store
            .fetch_item(adjustment.item_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Item not found"))?;

        if item.owner_id != owner_id {
            return Err(DomainError::forbidden("Not authorized to update this item").into());
        }

        if item.quantity != adjustment.old_quantity {
            return Err(DomainError::conflict(
                "Old quantity does not match current item quantity",
            )
            .into());
        }

        let now = Utc::now();
        let update = StockUpdate::record(&adjustment, owner_id, actor, now);
        let mut adjusted = item;
        adjusted.apply_adjustment(adjustment.new_quantity, actor, now);

        self.store
            .record_adjustment(&update, &adjusted)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ServiceError::Domain(DomainError::conflict(
                    "Old quantity does not match current item quantity",
                )),
                other => other.into(),
            })?;

        Ok(update)
    }

    /// Fetch one stock update, enforcing ownership.
    pub async fn get_stock_update(
        &self,
        id: StockUpdateId,
        owner_id: UserId,
    ) -> ServiceResult<StockUpdateWithItem> {
        let update = self
            .store
            .fetch_stock_update(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Stock update not found"))?;

        if update.update.owner_id != owner_id {
            return Err(
                DomainError::forbidden("Not authorized to access this stock update").into(),
            );
        }

        Ok(update)
    }

    /// Page through the owner's stock updates.
    pub async fn list_stock_updates(
        &self,
        owner_id: UserId,
        filter: &StockUpdateFilter,
        sort: StockUpdateSort,
        page: PageRequest,
    ) -> ServiceResult<Page<StockUpdateWithItem>> {
        Ok(self
            .store
            .query_stock_updates(owner_id, filter, sort, page)
            .await?)
    }

    /// Page through one item's history, checking the item first so a missing
    /// or foreign item fails like the item routes do.
    pub async fn list_for_item(
        &self,
        item_id: ItemId,
        owner_id: UserId,
        sort: StockUpdateSort,
        page: PageRequest,
    ) -> ServiceResult<Page<StockUpdateWithItem>> {
        let item = self
            .store
            .fetch_item(item_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Item not found"))?;
        if item.owner_id != owner_id {
            return Err(DomainError::forbidden("Not authorized to access this item").into());
        }

        let filter = StockUpdateFilter {
            item_id: Some(item_id),
            ..StockUpdateFilter::default()
        };
        self.list_stock_updates(owner_id, &filter, sort, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ItemService;
    use crate::store::InMemoryInventoryStore;
    use chrono::Duration;
    use pantry_inventory::{Category, Item, NewItem, StockLevel, Unit};

    struct Fixture {
        stock: StockUpdateService,
        items: ItemService,
        store: Arc<InMemoryInventoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryInventoryStore::new());
        Fixture {
            stock: StockUpdateService::new(store.clone()),
            items: ItemService::new(store.clone()),
            store,
        }
    }

    async fn seed_item(fx: &Fixture, owner: UserId, name: &str, quantity: f64) -> Item {
        fx.items
            .create_item(
                NewItem {
                    name: name.to_string(),
                    category: Category::Dairy,
                    brand: None,
                    quantity,
                    unit: Unit::Liter,
                    min_stock_level: 2.0,
                    price: None,
                    notes: None,
                },
                owner,
                "dana",
            )
            .await
            .unwrap()
    }

    fn adjustment(item_id: ItemId, old: f64, new: f64) -> StockAdjustment {
        StockAdjustment {
            item_id,
            old_quantity: old,
            new_quantity: new,
            notes: Some("weekly count".to_string()),
        }
    }

    #[tokio::test]
    async fn adjust_appends_history_and_updates_the_item() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "milk", 2.0).await;

        let update = fx
            .stock
            .adjust_stock(adjustment(item.id, 2.0, 0.5), owner, "sam")
            .await
            .unwrap();
        assert_eq!(update.old_quantity, 2.0);
        assert_eq!(update.new_quantity, 0.5);
        assert_eq!(update.quantity_change(), -1.5);
        assert_eq!(update.updated_by, "sam");

        let refreshed = fx.items.get_item(item.id, owner).await.unwrap();
        assert_eq!(refreshed.quantity, 0.5);
        assert_eq!(refreshed.stock_level, StockLevel::Low);
        assert_eq!(refreshed.updated_by, "sam");

        let page = fx
            .stock
            .list_stock_updates(
                owner,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.results[0].update.id, update.id);
        assert_eq!(page.results[0].item.as_ref().unwrap().name, "milk");
    }

    #[tokio::test]
    async fn invalid_quantities_fail_before_any_lookup() {
        let fx = fixture();
        let err = fx
            .stock
            .adjust_stock(adjustment(ItemId::new(), -1.0, 2.0), UserId::new(), "sam")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_and_foreign_items_fail_in_order() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "curd", 2.0).await;

        let err = fx
            .stock
            .adjust_stock(adjustment(ItemId::new(), 2.0, 1.0), owner, "sam")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Item not found");

        let err = fx
            .stock
            .adjust_stock(adjustment(item.id, 2.0, 1.0), UserId::new(), "sam")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to update this item");
    }

    #[tokio::test]
    async fn stale_quantity_claim_is_a_conflict() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "butter", 2.0).await;

        let err = fx
            .stock
            .adjust_stock(adjustment(item.id, 1.5, 1.0), owner, "sam")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::Conflict(_))
        ));
        assert_eq!(
            err.to_string(),
            "Old quantity does not match current item quantity"
        );
    }

    #[tokio::test]
    async fn second_claimant_of_the_same_quantity_loses() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "paneer", 2.0).await;

        fx.stock
            .adjust_stock(adjustment(item.id, 2.0, 1.5), owner, "sam")
            .await
            .unwrap();

        let err = fx
            .stock
            .adjust_stock(adjustment(item.id, 2.0, 1.0), owner, "kim")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Old quantity does not match current item quantity"
        );

        // Only the winning adjustment is in the history.
        let page = fx
            .stock
            .list_stock_updates(
                owner,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.results[0].update.new_quantity, 1.5);
    }

    #[tokio::test]
    async fn failed_item_write_leaves_no_history_row() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "cheese", 2.0).await;
        fx.store.fail_item_writes(true);

        let err = fx
            .stock
            .adjust_stock(adjustment(item.id, 2.0, 1.0), owner, "sam")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Backend(_))));

        fx.store.fail_item_writes(false);
        let page = fx
            .stock
            .list_stock_updates(
                owner,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert!(page.results.is_empty());
        assert_eq!(fx.items.get_item(item.id, owner).await.unwrap().quantity, 2.0);
    }

    #[tokio::test]
    async fn history_outlives_its_item() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "yogurt", 2.0).await;

        let update = fx
            .stock
            .adjust_stock(adjustment(item.id, 2.0, 1.0), owner, "sam")
            .await
            .unwrap();
        fx.items.delete_item(item.id, owner).await.unwrap();

        let fetched = fx.stock.get_stock_update(update.id, owner).await.unwrap();
        assert!(fetched.item.is_none());
        assert_eq!(fetched.update.old_quantity, 2.0);

        let page = fx
            .stock
            .list_stock_updates(
                owner,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
    }

    #[tokio::test]
    async fn get_enforces_ownership_with_its_own_messages() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "lassi", 2.0).await;
        let update = fx
            .stock
            .adjust_stock(adjustment(item.id, 2.0, 1.0), owner, "sam")
            .await
            .unwrap();

        let err = fx
            .stock
            .get_stock_update(StockUpdateId::new(), owner)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Stock update not found");

        let err = fx
            .stock
            .get_stock_update(update.id, UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to access this stock update");
    }

    #[tokio::test]
    async fn list_for_item_checks_the_item_before_querying() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "kefir", 4.0).await;
        let other = seed_item(&fx, owner, "cream", 4.0).await;
        fx.stock
            .adjust_stock(adjustment(item.id, 4.0, 3.0), owner, "sam")
            .await
            .unwrap();
        fx.stock
            .adjust_stock(adjustment(other.id, 4.0, 2.0), owner, "sam")
            .await
            .unwrap();

        let err = fx
            .stock
            .list_for_item(
                ItemId::new(),
                owner,
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Item not found");

        let err = fx
            .stock
            .list_for_item(
                item.id,
                UserId::new(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to access this item");

        let page = fx
            .stock
            .list_for_item(
                item.id,
                owner,
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.results[0].update.item_id, item.id);
    }

    #[tokio::test]
    async fn date_range_filters_are_inclusive() {
        let fx = fixture();
        let owner = UserId::new();
        let item = seed_item(&fx, owner, "malai", 6.0).await;
        let base = Utc::now();

        // Backdate rows through the store to get a known timeline.
        let mut current = fx.items.get_item(item.id, owner).await.unwrap();
        for (hours_ago, new_quantity) in [(2i64, 5.0f64), (1, 4.0), (0, 3.0)] {
            let when = base - Duration::hours(hours_ago);
            let adj = adjustment(item.id, current.quantity, new_quantity);
            let update = StockUpdate::record(&adj, owner, "sam", when);
            let mut adjusted = current.clone();
            adjusted.apply_adjustment(new_quantity, "sam", when);
            fx.store.record_adjustment(&update, &adjusted).await.unwrap();
            current = adjusted;
        }

        let filter = StockUpdateFilter {
            start_date: Some(base - Duration::hours(1)),
            end_date: None,
            ..StockUpdateFilter::default()
        };
        let page = fx
            .stock
            .list_stock_updates(
                owner,
                &filter,
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 2);

        let filter = StockUpdateFilter {
            start_date: Some(base - Duration::hours(1)),
            end_date: Some(base - Duration::hours(1)),
            ..StockUpdateFilter::default()
        };
        let page = fx
            .stock
            .list_stock_updates(
                owner,
                &filter,
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.results[0].update.new_quantity, 4.0);
    }
}
