use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use pantry_core::{ItemId, Page, PageRequest, SortDirection, StockUpdateId, UserId};
use pantry_inventory::{
    Item, ItemFilter, ItemSort, ItemSortKey, ItemSummary, StockUpdate, StockUpdateFilter,
    StockUpdateSort, StockUpdateSortKey, StockUpdateWithItem,
};

use super::r#trait::{InventoryStore, StoreError};

#[derive(Debug, Default)]
struct State {
    items: HashMap<ItemId, Item>,
    updates: Vec<StockUpdate>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Not optimized for performance. Mirrors the
/// Postgres implementation's semantics: name uniqueness per owner, the
/// conditional quantity check in `record_adjustment`, and history that
/// survives item deletion.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
    fail_item_writes: AtomicBool,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the item half of `record_adjustment` fail, for atomicity tests.
    pub fn fail_item_writes(&self, fail: bool) {
        self.fail_item_writes.store(fail, Ordering::SeqCst);
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        let mut state = self.write_state()?;

        let duplicate = state
            .items
            .values()
            .any(|existing| existing.owner_id == item.owner_id && existing.name == item.name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "duplicate item name '{}'",
                item.name
            )));
        }

        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let state = self.read_state()?;
        Ok(state.items.get(&id).cloned())
    }

    async fn fetch_item_by_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> Result<Option<Item>, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .items
            .values()
            .find(|item| item.owner_id == owner_id && item.name == name)
            .cloned())
    }

    async fn update_item(&self, item: &Item) -> Result<(), StoreError> {
        let mut state = self.write_state()?;

        if !state.items.contains_key(&item.id) {
            return Err(StoreError::NotFound(format!("item {}", item.id)));
        }

        let duplicate = state.items.values().any(|existing| {
            existing.id != item.id
                && existing.owner_id == item.owner_id
                && existing.name == item.name
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "duplicate item name '{}'",
                item.name
            )));
        }

        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let mut state = self.write_state()?;
        if state.items.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("item {id}")));
        }
        Ok(())
    }

    async fn query_items(
        &self,
        owner_id: UserId,
        filter: &ItemFilter,
        sort: ItemSort,
        page: PageRequest,
    ) -> Result<Page<Item>, StoreError> {
        let state = self.read_state()?;
        let search = filter.search.as_deref().map(str::to_lowercase);

        let mut matches: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.owner_id == owner_id)
            .filter(|item| filter.category.is_none_or(|c| item.category == c))
            .filter(|item| filter.stock_level.is_none_or(|l| item.stock_level == l))
            .filter(|item| {
                search
                    .as_deref()
                    .is_none_or(|term| item.name.to_lowercase().contains(term))
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| order_items(a, b, sort));
        let total = matches.len() as u64;
        Ok(Page::new(paginate(matches, page), page, total))
    }

    async fn record_adjustment(
        &self,
        update: &StockUpdate,
        updated_item: &Item,
    ) -> Result<(), StoreError> {
        let mut state = self.write_state()?;

        let current = state
            .items
            .get(&update.item_id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", update.item_id)))?;
        if current.quantity != update.old_quantity {
            return Err(StoreError::Conflict(format!(
                "quantity of item {} changed concurrently",
                update.item_id
            )));
        }

        // Fault injection happens before either write; a failed call must
        // leave no partial state behind.
        if self.fail_item_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "injected item write failure".to_string(),
            ));
        }

        state.updates.push(update.clone());
        state.items.insert(updated_item.id, updated_item.clone());
        Ok(())
    }

    async fn fetch_stock_update(
        &self,
        id: StockUpdateId,
    ) -> Result<Option<StockUpdateWithItem>, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .updates
            .iter()
            .find(|update| update.id == id)
            .map(|update| join_item(update, &state.items)))
    }

    async fn query_stock_updates(
        &self,
        owner_id: UserId,
        filter: &StockUpdateFilter,
        sort: StockUpdateSort,
        page: PageRequest,
    ) -> Result<Page<StockUpdateWithItem>, StoreError> {
        let state = self.read_state()?;

        let mut matches: Vec<StockUpdate> = state
            .updates
            .iter()
            .filter(|update| update.owner_id == owner_id)
            .filter(|update| filter.item_id.is_none_or(|id| update.item_id == id))
            .filter(|update| filter.start_date.is_none_or(|start| update.created_at >= start))
            .filter(|update| filter.end_date.is_none_or(|end| update.created_at <= end))
            .cloned()
            .collect();

        matches.sort_by(|a, b| order_stock_updates(a, b, sort));
        let total = matches.len() as u64;
        let joined = paginate(matches, page)
            .iter()
            .map(|update| join_item(update, &state.items))
            .collect();
        Ok(Page::new(joined, page, total))
    }
}

fn join_item(update: &StockUpdate, items: &HashMap<ItemId, Item>) -> StockUpdateWithItem {
    StockUpdateWithItem {
        update: update.clone(),
        item: items.get(&update.item_id).map(ItemSummary::of),
    }
}

fn paginate<T>(rows: Vec<T>, page: PageRequest) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

fn order_items(a: &Item, b: &Item, sort: ItemSort) -> CmpOrdering {
    let ord = match sort.key {
        ItemSortKey::Name => a.name.cmp(&b.name),
        ItemSortKey::Category => a.category.as_str().cmp(b.category.as_str()),
        ItemSortKey::Quantity => a.quantity.total_cmp(&b.quantity),
        ItemSortKey::StockLevel => a.stock_level.as_str().cmp(b.stock_level.as_str()),
        // Items without a price sort after priced ones, like SQL NULLS LAST.
        ItemSortKey::Price => match (a.price, b.price) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => CmpOrdering::Less,
            (None, Some(_)) => CmpOrdering::Greater,
            (None, None) => CmpOrdering::Equal,
        },
        ItemSortKey::LastUpdated => a.last_updated.cmp(&b.last_updated),
    };
    directed(ord, sort.direction).then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
}

fn order_stock_updates(a: &StockUpdate, b: &StockUpdate, sort: StockUpdateSort) -> CmpOrdering {
    let ord = match sort.key {
        StockUpdateSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        StockUpdateSortKey::OldQuantity => a.old_quantity.total_cmp(&b.old_quantity),
        StockUpdateSortKey::NewQuantity => a.new_quantity.total_cmp(&b.new_quantity),
    };
    directed(ord, sort.direction).then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
}

fn directed(ord: CmpOrdering, direction: SortDirection) -> CmpOrdering {
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pantry_inventory::{Category, NewItem, StockAdjustment, Unit};

    fn test_item(owner: UserId, name: &str, quantity: f64) -> Item {
        Item::create(
            NewItem {
                name: name.to_string(),
                category: Category::Rice,
                brand: None,
                quantity,
                unit: Unit::Kg,
                min_stock_level: 2.0,
                price: None,
                notes: None,
            },
            owner,
            "dana",
            Utc::now(),
        )
        .unwrap()
    }

    fn test_update(item: &Item, old: f64, new: f64) -> (StockUpdate, Item) {
        let adjustment = StockAdjustment {
            item_id: item.id,
            old_quantity: old,
            new_quantity: new,
            notes: None,
        };
        let now = Utc::now();
        let update = StockUpdate::record(&adjustment, item.owner_id, "dana", now);
        let mut adjusted = item.clone();
        adjusted.apply_adjustment(new, "dana", now);
        (update, adjusted)
    }

    #[tokio::test]
    async fn duplicate_name_for_same_owner_conflicts() {
        let store = InMemoryInventoryStore::new();
        let owner = UserId::new();
        store.insert_item(&test_item(owner, "rice", 1.0)).await.unwrap();

        let err = store
            .insert_item(&test_item(owner, "rice", 5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // A different owner can reuse the name.
        store
            .insert_item(&test_item(UserId::new(), "rice", 5.0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stale_quantity_rejects_the_adjustment_and_keeps_no_row() {
        let store = InMemoryInventoryStore::new();
        let item = test_item(UserId::new(), "atta", 2.0);
        store.insert_item(&item).await.unwrap();

        let (update, adjusted) = test_update(&item, 3.0, 1.0);
        let err = store.record_adjustment(&update, &adjusted).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let page = store
            .query_stock_updates(
                item.owner_id,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert!(page.results.is_empty());

        let stored = store.fetch_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2.0);
    }

    #[tokio::test]
    async fn injected_item_write_failure_keeps_no_audit_row() {
        let store = InMemoryInventoryStore::new();
        let item = test_item(UserId::new(), "ghee", 2.0);
        store.insert_item(&item).await.unwrap();
        store.fail_item_writes(true);

        let (update, adjusted) = test_update(&item, 2.0, 1.0);
        let err = store.record_adjustment(&update, &adjusted).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let page = store
            .query_stock_updates(
                item.owner_id,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert!(page.results.is_empty());
        assert_eq!(
            store.fetch_item(item.id).await.unwrap().unwrap().quantity,
            2.0
        );
    }

    #[tokio::test]
    async fn query_items_filters_sorts_and_pages() {
        let store = InMemoryInventoryStore::new();
        let owner = UserId::new();
        store.insert_item(&test_item(owner, "basmati", 1.0)).await.unwrap();
        store.insert_item(&test_item(owner, "toor dal", 3.0)).await.unwrap();
        store.insert_item(&test_item(owner, "salt", 2.0)).await.unwrap();
        store
            .insert_item(&test_item(UserId::new(), "sugar", 9.0))
            .await
            .unwrap();

        let sort = ItemSort::parse("quantity:asc").unwrap();
        let page = store
            .query_items(
                owner,
                &ItemFilter::default(),
                sort,
                PageRequest::new(1, 2).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_results, 3);
        assert_eq!(page.total_pages, 2);
        let names: Vec<&str> = page.results.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["basmati", "salt"]);

        let second = store
            .query_items(
                owner,
                &ItemFilter::default(),
                sort,
                PageRequest::new(2, 2).unwrap(),
            )
            .await
            .unwrap();
        let names: Vec<&str> = second.results.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["toor dal"]);

        let filtered = store
            .query_items(
                owner,
                &ItemFilter {
                    search: Some("DAL".to_string()),
                    ..ItemFilter::default()
                },
                ItemSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(filtered.results.len(), 1);
        assert_eq!(filtered.results[0].name, "toor dal");
    }

    #[tokio::test]
    async fn history_survives_item_deletion_with_a_null_summary() {
        let store = InMemoryInventoryStore::new();
        let item = test_item(UserId::new(), "milk", 2.0);
        store.insert_item(&item).await.unwrap();

        let (update, adjusted) = test_update(&item, 2.0, 1.0);
        store.record_adjustment(&update, &adjusted).await.unwrap();

        let fetched = store.fetch_stock_update(update.id).await.unwrap().unwrap();
        assert_eq!(fetched.item.as_ref().unwrap().name, "milk");

        store.delete_item(item.id).await.unwrap();

        let fetched = store.fetch_stock_update(update.id).await.unwrap().unwrap();
        assert!(fetched.item.is_none());
        assert_eq!(fetched.update.new_quantity, 1.0);
    }

    #[tokio::test]
    async fn stock_updates_default_to_newest_first() {
        let store = InMemoryInventoryStore::new();
        let item = test_item(UserId::new(), "oats", 5.0);
        store.insert_item(&item).await.unwrap();

        let (first, after_first) = test_update(&item, 5.0, 3.0);
        let mut first = first;
        first.created_at = Utc::now() - Duration::hours(1);
        store.record_adjustment(&first, &after_first).await.unwrap();

        let (second, after_second) = test_update(&after_first, 3.0, 4.0);
        store.record_adjustment(&second, &after_second).await.unwrap();

        let page = store
            .query_stock_updates(
                item.owner_id,
                &StockUpdateFilter::default(),
                StockUpdateSort::default(),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].update.id, second.id);
        assert_eq!(page.results[1].update.id, first.id);
    }
}
