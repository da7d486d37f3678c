//! Postgres-backed inventory store.
//!
//! Items live in the `items` table; stock updates live in the append-only
//! `stock_updates` table. There is deliberately no foreign key between the
//! two, so item deletion never cascades into the audit history.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate item name for an owner |
//! | Database (other) | Any other | `Backend` | Check violations, encoding issues |
//! | PoolClosed | N/A | `Backend` | Connection pool was closed |
//! | Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! A conditional quantity update that matches zero rows is reported as
//! `Conflict` after an explicit rollback; it never reaches the error mapper.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use std::sync::Arc;
use tracing::instrument;

use pantry_core::{ItemId, Page, PageRequest, SortDirection, StockUpdateId, UserId};
use pantry_inventory::{
    Item, ItemFilter, ItemSort, ItemSortKey, ItemSummary, StockUpdate, StockUpdateFilter,
    StockUpdateSort, StockUpdateSortKey, StockUpdateWithItem,
};

use super::r#trait::{InventoryStore, StoreError};

const ITEM_COLUMNS: &str = "\
    id, owner_id, name, category, brand, quantity, unit, min_stock_level, \
    price, stock_level, notes, image_url, last_updated, updated_by, \
    created_at, updated_at";

const STOCK_UPDATE_COLUMNS: &str = "\
    su.id, su.item_id, su.owner_id, su.old_quantity, su.new_quantity, \
    su.updated_by, su.notes, su.created_at, \
    i.id AS joined_item_id, i.name AS item_name, \
    i.category AS item_category, i.unit AS item_unit";

/// Postgres-backed implementation of [`InventoryStore`].
///
/// ## Concurrency
///
/// `record_adjustment` runs both writes in a single transaction and makes the
/// item update conditional on `quantity` still holding the value the caller
/// read. A concurrent adjustment makes that UPDATE match zero rows, the
/// transaction rolls back, and the caller gets `StoreError::Conflict` with no
/// audit row left behind.
///
/// ## Owner Scoping
///
/// List queries filter by `owner_id` in the WHERE clause; point reads return
/// rows regardless of owner and leave the ownership check to the service
/// layer, which needs to distinguish "not found" from "not yours".
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    /// Create a new store over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(
        skip(self, item),
        fields(item_id = %item.id, owner_id = %item.owner_id),
        err
    )]
    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id,
                owner_id,
                name,
                category,
                brand,
                quantity,
                unit,
                min_stock_level,
                price,
                stock_level,
                notes,
                image_url,
                last_updated,
                updated_by,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.owner_id.as_uuid())
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(&item.brand)
        .bind(item.quantity)
        .bind(item.unit.as_str())
        .bind(item.min_stock_level)
        .bind(item.price)
        .bind(item.stock_level.as_str())
        .bind(&item.notes)
        .bind(&item.image_url)
        .bind(item.last_updated)
        .bind(&item.updated_by)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("duplicate item name '{}'", item.name))
            } else {
                map_sqlx_error("insert_item", e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn fetch_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_item", e))?;

        match row {
            Some(row) => {
                let item_row = ItemRow::from_row(&row)
                    .map_err(|e| StoreError::Backend(format!("failed to read item row: {e}")))?;
                Ok(Some(item_row.try_into()?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, name), fields(owner_id = %owner_id), err)]
    async fn fetch_item_by_name(
        &self,
        owner_id: UserId,
        name: &str,
    ) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = $1 AND name = $2"
        ))
        .bind(owner_id.as_uuid())
        .bind(name)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_item_by_name", e))?;

        match row {
            Some(row) => {
                let item_row = ItemRow::from_row(&row)
                    .map_err(|e| StoreError::Backend(format!("failed to read item row: {e}")))?;
                Ok(Some(item_row.try_into()?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn update_item(&self, item: &Item) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = $2,
                category = $3,
                brand = $4,
                quantity = $5,
                unit = $6,
                min_stock_level = $7,
                price = $8,
                stock_level = $9,
                notes = $10,
                image_url = $11,
                last_updated = $12,
                updated_by = $13,
                updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(&item.brand)
        .bind(item.quantity)
        .bind(item.unit.as_str())
        .bind(item.min_stock_level)
        .bind(item.price)
        .bind(item.stock_level.as_str())
        .bind(&item.notes)
        .bind(&item.image_url)
        .bind(item.last_updated)
        .bind(&item.updated_by)
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("duplicate item name '{}'", item.name))
            } else {
                map_sqlx_error("update_item", e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("item {}", item.id)));
        }

        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("item {id}")));
        }

        Ok(())
    }

    #[instrument(
        skip(self, filter, sort, page),
        fields(owner_id = %owner_id, page = page.page(), limit = page.limit()),
        err
    )]
    async fn query_items(
        &self,
        owner_id: UserId,
        filter: &ItemFilter,
        sort: ItemSort,
        page: PageRequest,
    ) -> Result<Page<Item>, StoreError> {
        // Optional filters use the COALESCE-style `($n IS NULL OR col = $n)`
        // shape so one parameterized query covers every combination.
        let category_param: Option<&str> = filter.category.map(|c| c.as_str());
        let level_param: Option<&str> = filter.stock_level.map(|l| l.as_str());
        let search_param: Option<String> = filter.search.as_deref().map(like_pattern);

        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) as total
            FROM items
            WHERE owner_id = $1
                AND ($2::text IS NULL OR category = $2)
                AND ($3::text IS NULL OR stock_level = $3)
                AND ($4::text IS NULL OR name ILIKE $4)
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(category_param)
        .bind(level_param)
        .bind(search_param.as_deref())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_items", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StoreError::Backend(format!("failed to read count: {e}")))?;

        // Sort columns come from a closed enum, never from caller input.
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
            WHERE owner_id = $1
                AND ($2::text IS NULL OR category = $2)
                AND ($3::text IS NULL OR stock_level = $3)
                AND ($4::text IS NULL OR name ILIKE $4)
            ORDER BY {sort_column} {direction}, id ASC
            LIMIT $5 OFFSET $6
            "#,
            sort_column = item_sort_column(sort.key),
            direction = direction_sql(sort.direction),
        ))
        .bind(owner_id.as_uuid())
        .bind(category_param)
        .bind(level_param)
        .bind(search_param.as_deref())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_items", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let item_row = ItemRow::from_row(&row)
                .map_err(|e| StoreError::Backend(format!("failed to read item row: {e}")))?;
            items.push(item_row.try_into()?);
        }

        Ok(Page::new(items, page, total as u64))
    }

    #[instrument(
        skip(self, update, updated_item),
        fields(item_id = %update.item_id, stock_update_id = %update.id),
        err
    )]
    async fn record_adjustment(
        &self,
        update: &StockUpdate,
        updated_item: &Item,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO stock_updates (
                id,
                item_id,
                owner_id,
                old_quantity,
                new_quantity,
                updated_by,
                notes,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(update.id.as_uuid())
        .bind(update.item_id.as_uuid())
        .bind(update.owner_id.as_uuid())
        .bind(update.old_quantity)
        .bind(update.new_quantity)
        .bind(&update.updated_by)
        .bind(&update.notes)
        .bind(update.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_stock_update", e))?;

        // Conditional on the quantity the caller read still being in place.
        let result = sqlx::query(
            r#"
            UPDATE items SET
                quantity = $2,
                stock_level = $3,
                last_updated = $4,
                updated_by = $5,
                updated_at = $6
            WHERE id = $1 AND quantity = $7
            "#,
        )
        .bind(updated_item.id.as_uuid())
        .bind(updated_item.quantity)
        .bind(updated_item.stock_level.as_str())
        .bind(updated_item.last_updated)
        .bind(&updated_item.updated_by)
        .bind(updated_item.updated_at)
        .bind(update.old_quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_item_quantity", e))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Conflict(format!(
                "quantity of item {} changed concurrently",
                update.item_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(stock_update_id = %id), err)]
    async fn fetch_stock_update(
        &self,
        id: StockUpdateId,
    ) -> Result<Option<StockUpdateWithItem>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {STOCK_UPDATE_COLUMNS}
            FROM stock_updates su
            LEFT JOIN items i ON i.id = su.item_id
            WHERE su.id = $1
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_stock_update", e))?;

        match row {
            Some(row) => {
                let update_row = StockUpdateRow::from_row(&row).map_err(|e| {
                    StoreError::Backend(format!("failed to read stock update row: {e}"))
                })?;
                Ok(Some(update_row.into_with_item()?))
            }
            None => Ok(None),
        }
    }

    #[instrument(
        skip(self, filter, sort, page),
        fields(owner_id = %owner_id, page = page.page(), limit = page.limit()),
        err
    )]
    async fn query_stock_updates(
        &self,
        owner_id: UserId,
        filter: &StockUpdateFilter,
        sort: StockUpdateSort,
        page: PageRequest,
    ) -> Result<Page<StockUpdateWithItem>, StoreError> {
        let item_id_param: Option<uuid::Uuid> = filter.item_id.map(|id| *id.as_uuid());

        // The count skips the join; the filters only touch stock_updates.
        let count_row = sqlx::query(
            r#"
            SELECT COUNT(*) as total
            FROM stock_updates
            WHERE owner_id = $1
                AND ($2::uuid IS NULL OR item_id = $2)
                AND ($3::timestamptz IS NULL OR created_at >= $3)
                AND ($4::timestamptz IS NULL OR created_at <= $4)
            "#,
        )
        .bind(owner_id.as_uuid())
        .bind(item_id_param)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_stock_updates", e))?;

        let total: i64 = count_row
            .try_get("total")
            .map_err(|e| StoreError::Backend(format!("failed to read count: {e}")))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {STOCK_UPDATE_COLUMNS}
            FROM stock_updates su
            LEFT JOIN items i ON i.id = su.item_id
            WHERE su.owner_id = $1
                AND ($2::uuid IS NULL OR su.item_id = $2)
                AND ($3::timestamptz IS NULL OR su.created_at >= $3)
                AND ($4::timestamptz IS NULL OR su.created_at <= $4)
            ORDER BY su.{sort_column} {direction}, su.id ASC
            LIMIT $5 OFFSET $6
            "#,
            sort_column = stock_update_sort_column(sort.key),
            direction = direction_sql(sort.direction),
        ))
        .bind(owner_id.as_uuid())
        .bind(item_id_param)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_stock_updates", e))?;

        let mut updates = Vec::with_capacity(rows.len());
        for row in rows {
            let update_row = StockUpdateRow::from_row(&row).map_err(|e| {
                StoreError::Backend(format!("failed to read stock update row: {e}"))
            })?;
            updates.push(update_row.into_with_item()?);
        }

        Ok(Page::new(updates, page, total as u64))
    }
}

/// Escape LIKE metacharacters and wrap in wildcards for a substring match.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn item_sort_column(key: ItemSortKey) -> &'static str {
    match key {
        ItemSortKey::Name => "name",
        ItemSortKey::Category => "category",
        ItemSortKey::Quantity => "quantity",
        ItemSortKey::StockLevel => "stock_level",
        ItemSortKey::Price => "price",
        ItemSortKey::LastUpdated => "last_updated",
    }
}

fn stock_update_sort_column(key: StockUpdateSortKey) -> &'static str {
    match key {
        StockUpdateSortKey::CreatedAt => "created_at",
        StockUpdateSortKey::OldQuantity => "old_quantity",
        StockUpdateSortKey::NewQuantity => "new_quantity",
    }
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    "23505" => StoreError::Conflict(msg),
                    _ => StoreError::Backend(msg),
                }
            } else {
                StoreError::Backend(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct ItemRow {
    id: uuid::Uuid,
    owner_id: uuid::Uuid,
    name: String,
    category: String,
    brand: Option<String>,
    quantity: f64,
    unit: String,
    min_stock_level: f64,
    price: Option<f64>,
    stock_level: String,
    notes: Option<String>,
    image_url: Option<String>,
    last_updated: DateTime<Utc>,
    updated_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ItemRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            brand: row.try_get("brand")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            min_stock_level: row.try_get("min_stock_level")?,
            price: row.try_get("price")?,
            stock_level: row.try_get("stock_level")?,
            notes: row.try_get("notes")?,
            image_url: row.try_get("image_url")?,
            last_updated: row.try_get("last_updated")?,
            updated_by: row.try_get("updated_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: ItemId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            name: row.name,
            category: row.category.parse().map_err(corrupt_row)?,
            brand: row.brand,
            quantity: row.quantity,
            unit: row.unit.parse().map_err(corrupt_row)?,
            min_stock_level: row.min_stock_level,
            price: row.price,
            stock_level: row.stock_level.parse().map_err(corrupt_row)?,
            notes: row.notes,
            image_url: row.image_url,
            last_updated: row.last_updated,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct StockUpdateRow {
    id: uuid::Uuid,
    item_id: uuid::Uuid,
    owner_id: uuid::Uuid,
    old_quantity: f64,
    new_quantity: f64,
    updated_by: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    joined_item_id: Option<uuid::Uuid>,
    item_name: Option<String>,
    item_category: Option<String>,
    item_unit: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StockUpdateRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StockUpdateRow {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            owner_id: row.try_get("owner_id")?,
            old_quantity: row.try_get("old_quantity")?,
            new_quantity: row.try_get("new_quantity")?,
            updated_by: row.try_get("updated_by")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            joined_item_id: row.try_get("joined_item_id")?,
            item_name: row.try_get("item_name")?,
            item_category: row.try_get("item_category")?,
            item_unit: row.try_get("item_unit")?,
        })
    }
}

impl StockUpdateRow {
    /// The joined item columns are all present or all NULL; a deleted item
    /// yields `item: None`.
    fn into_with_item(self) -> Result<StockUpdateWithItem, StoreError> {
        let item = match (
            self.joined_item_id,
            self.item_name,
            self.item_category,
            self.item_unit,
        ) {
            (Some(id), Some(name), Some(category), Some(unit)) => Some(ItemSummary {
                id: ItemId::from_uuid(id),
                name,
                category: category.parse().map_err(corrupt_row)?,
                unit: unit.parse().map_err(corrupt_row)?,
            }),
            _ => None,
        };

        Ok(StockUpdateWithItem {
            update: StockUpdate {
                id: StockUpdateId::from_uuid(self.id),
                item_id: ItemId::from_uuid(self.item_id),
                owner_id: UserId::from_uuid(self.owner_id),
                old_quantity: self.old_quantity,
                new_quantity: self.new_quantity,
                updated_by: self.updated_by,
                notes: self.notes,
                created_at: self.created_at,
            },
            item,
        })
    }
}

fn corrupt_row(e: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt row: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("dal"), "%dal%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn sort_columns_are_snake_case() {
        assert_eq!(item_sort_column(ItemSortKey::StockLevel), "stock_level");
        assert_eq!(item_sort_column(ItemSortKey::LastUpdated), "last_updated");
        assert_eq!(
            stock_update_sort_column(StockUpdateSortKey::OldQuantity),
            "old_quantity"
        );
    }
}
