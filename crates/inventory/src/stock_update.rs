use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pantry_core::{DomainResult, ItemId, StockUpdateId, UserId};

use crate::item::{Category, Item, Unit, ensure_non_negative};

/// Caller-supplied payload for the stock-adjustment transaction.
///
/// `old_quantity` is the caller's claim about the item's current quantity; the
/// adjustment only commits if the claim still holds at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub item_id: ItemId,
    pub old_quantity: f64,
    pub new_quantity: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StockAdjustment {
    pub fn validate(&self) -> DomainResult<()> {
        ensure_non_negative("oldQuantity", self.old_quantity)?;
        ensure_non_negative("newQuantity", self.new_quantity)?;
        Ok(())
    }
}

/// Immutable audit record of one committed stock adjustment.
///
/// Append-only: nothing in the codebase updates or deletes one of these, and
/// the rows outlive their item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub id: StockUpdateId,
    pub item_id: ItemId,
    pub owner_id: UserId,
    pub old_quantity: f64,
    pub new_quantity: f64,
    pub updated_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockUpdate {
    /// Record an adjustment that has already passed the service checks.
    pub fn record(
        adjustment: &StockAdjustment,
        owner_id: UserId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StockUpdateId::new(),
            item_id: adjustment.item_id,
            owner_id,
            old_quantity: adjustment.old_quantity,
            new_quantity: adjustment.new_quantity,
            updated_by: actor.to_string(),
            notes: adjustment.notes.clone(),
            created_at: now,
        }
    }

    /// Signed delta (positive means restock, negative means consumption).
    pub fn quantity_change(&self) -> f64 {
        self.new_quantity - self.old_quantity
    }
}

/// Slimmed item fields joined onto stock-update reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub unit: Unit,
}

impl ItemSummary {
    pub fn of(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            category: item.category,
            unit: item.unit,
        }
    }
}

/// A stock update plus the summary of its item, as returned by reads.
///
/// `item` is `None` when the item has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUpdateWithItem {
    #[serde(flatten)]
    pub update: StockUpdate,
    pub item: Option<ItemSummary>,
}
