use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, ItemId, UserId};

/// Grocery category. Closed set; unknown values are rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dal,
    Rice,
    Spices,
    Oil,
    Vegetables,
    Fruits,
    Dairy,
    Snacks,
    Condiments,
    Soap,
    Cleaning,
    Others,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Dal,
        Category::Rice,
        Category::Spices,
        Category::Oil,
        Category::Vegetables,
        Category::Fruits,
        Category::Dairy,
        Category::Snacks,
        Category::Condiments,
        Category::Soap,
        Category::Cleaning,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dal => "dal",
            Category::Rice => "rice",
            Category::Spices => "spices",
            Category::Oil => "oil",
            Category::Vegetables => "vegetables",
            Category::Fruits => "fruits",
            Category::Dairy => "dairy",
            Category::Snacks => "snacks",
            Category::Condiments => "condiments",
            Category::Soap => "soap",
            Category::Cleaning => "cleaning",
            Category::Others => "others",
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown category: {s}")))
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement unit for item quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Gram,
    Liter,
    Ml,
    Piece,
    Packet,
    Bottle,
}

impl Unit {
    pub const ALL: [Unit; 7] = [
        Unit::Kg,
        Unit::Gram,
        Unit::Liter,
        Unit::Ml,
        Unit::Piece,
        Unit::Packet,
        Unit::Bottle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Gram => "gram",
            Unit::Liter => "liter",
            Unit::Ml => "ml",
            Unit::Piece => "piece",
            Unit::Packet => "packet",
            Unit::Bottle => "bottle",
        }
    }
}

impl FromStr for Unit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown unit: {s}")))
    }
}

impl core::fmt::Display for Unit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived stock level of an item relative to its configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Out,
    Low,
    Medium,
    High,
}

impl StockLevel {
    pub const ALL: [StockLevel; 4] = [
        StockLevel::Out,
        StockLevel::Low,
        StockLevel::Medium,
        StockLevel::High,
    ];

    /// Classify a quantity against a minimum stock level.
    ///
    /// This is the only classification in the codebase; every write path that
    /// touches `quantity` or `min_stock_level` derives `stock_level` through
    /// it. Thresholds: zero is `Out`, at or below half the minimum is `Low`,
    /// at or below the minimum is `Medium`, above it is `High`.
    pub fn classify(quantity: f64, min_stock_level: f64) -> Self {
        if quantity == 0.0 {
            StockLevel::Out
        } else if quantity <= min_stock_level * 0.5 {
            StockLevel::Low
        } else if quantity <= min_stock_level {
            StockLevel::Medium
        } else {
            StockLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::Out => "out",
            StockLevel::Low => "low",
            StockLevel::Medium => "medium",
            StockLevel::High => "high",
        }
    }
}

impl FromStr for StockLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StockLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown stock level: {s}")))
    }
}

impl core::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pantry item owned by a single user.
///
/// Serializes to the wire shape (camelCase keys, lowercase enum values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub owner_id: UserId,
    pub name: String,
    pub category: Category,
    pub brand: Option<String>,
    pub quantity: f64,
    pub unit: Unit,
    pub min_stock_level: f64,
    pub price: Option<f64>,
    pub stock_level: StockLevel,
    pub notes: Option<String>,
    /// Stored but never set through the public surface.
    pub image_url: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Build a freshly created item, deriving its stock level.
    pub fn create(
        new_item: NewItem,
        owner_id: UserId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        new_item.validate()?;
        let stock_level = StockLevel::classify(new_item.quantity, new_item.min_stock_level);
        Ok(Self {
            id: ItemId::new(),
            owner_id,
            name: new_item.name,
            category: new_item.category,
            brand: new_item.brand,
            quantity: new_item.quantity,
            unit: new_item.unit,
            min_stock_level: new_item.min_stock_level,
            price: new_item.price,
            stock_level,
            notes: new_item.notes,
            image_url: None,
            last_updated: now,
            updated_by: actor.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update, re-deriving the stock level from the merged
    /// quantity and minimum.
    pub fn apply_patch(
        &mut self,
        patch: ItemPatch,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        patch.validate()?;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(brand) = patch.brand {
            self.brand = Some(brand);
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(min_stock_level) = patch.min_stock_level {
            self.min_stock_level = min_stock_level;
        }
        if let Some(price) = patch.price {
            self.price = Some(price);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        self.stock_level = StockLevel::classify(self.quantity, self.min_stock_level);
        self.touch(actor, now);
        Ok(())
    }

    /// Apply a committed stock adjustment: new quantity plus derived fields.
    pub fn apply_adjustment(&mut self, new_quantity: f64, actor: &str, now: DateTime<Utc>) {
        self.quantity = new_quantity;
        self.stock_level = StockLevel::classify(new_quantity, self.min_stock_level);
        self.touch(actor, now);
    }

    fn touch(&mut self, actor: &str, now: DateTime<Utc>) {
        self.last_updated = now;
        self.updated_by = actor.to_string();
        self.updated_at = now;
    }
}

/// Payload for creating an item. Validated before it touches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub brand: Option<String>,
    pub quantity: f64,
    pub unit: Unit,
    pub min_stock_level: f64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_non_negative("quantity", self.quantity)?;
        ensure_non_negative("minStockLevel", self.min_stock_level)?;
        if let Some(price) = self.price {
            ensure_non_negative("price", price)?;
        }
        Ok(())
    }
}

/// Partial item update. Absent fields are left untouched; optional fields
/// can be set but not cleared, matching the update contract of the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub min_stock_level: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.min_stock_level.is_none()
            && self.price.is_none()
            && self.notes.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation(
                "at least one field must be provided",
            ));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(quantity) = self.quantity {
            ensure_non_negative("quantity", quantity)?;
        }
        if let Some(min_stock_level) = self.min_stock_level {
            ensure_non_negative("minStockLevel", min_stock_level)?;
        }
        if let Some(price) = self.price {
            ensure_non_negative("price", price)?;
        }
        Ok(())
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!(
            "{field} must be a finite number"
        )));
    }
    if value < 0.0 {
        return Err(DomainError::validation(format!(
            "{field} must be at least 0"
        )));
    }
    Ok(())
}
