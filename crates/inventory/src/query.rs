//! Typed list-query options: filters and allow-listed sort keys.
//!
//! Sort input arrives on the wire as `field:direction`. Both halves are parsed
//! against closed sets; anything else is a validation error rather than a
//! silent fallback.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, ItemId, SortDirection};

use crate::item::{Category, StockLevel};

/// Filter for item list queries. All criteria are optional and conjunctive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub category: Option<Category>,
    pub stock_level: Option<StockLevel>,
    /// Case-insensitive substring match on the item name.
    pub search: Option<String>,
}

/// Filter for stock-update list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StockUpdateFilter {
    pub item_id: Option<ItemId>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// A `(key, direction)` sort pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K> Sort<K>
where
    K: FromStr<Err = DomainError>,
{
    /// Parse the wire form `field:direction`.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let (field, direction) = raw.split_once(':').ok_or_else(|| {
            DomainError::validation(format!("sortBy must be field:direction, got: {raw}"))
        })?;
        Ok(Self {
            key: field.parse()?,
            direction: direction.parse()?,
        })
    }

    /// Parse an optional wire value, falling back to the entity default.
    pub fn parse_or_default(raw: Option<&str>) -> DomainResult<Self>
    where
        K: Default,
    {
        match raw {
            Some(raw) => Self::parse(raw),
            None => Ok(Self::default()),
        }
    }
}

/// Newest-first on the entity's default key.
impl<K: Default> Default for Sort<K> {
    fn default() -> Self {
        Self {
            key: K::default(),
            direction: SortDirection::Desc,
        }
    }
}

pub type ItemSort = Sort<ItemSortKey>;
pub type StockUpdateSort = Sort<StockUpdateSortKey>;

/// Sortable item fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemSortKey {
    Name,
    Category,
    Quantity,
    StockLevel,
    Price,
    #[default]
    LastUpdated,
}

impl ItemSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSortKey::Name => "name",
            ItemSortKey::Category => "category",
            ItemSortKey::Quantity => "quantity",
            ItemSortKey::StockLevel => "stockLevel",
            ItemSortKey::Price => "price",
            ItemSortKey::LastUpdated => "lastUpdated",
        }
    }
}

impl FromStr for ItemSortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ItemSortKey::Name),
            "category" => Ok(ItemSortKey::Category),
            "quantity" => Ok(ItemSortKey::Quantity),
            "stockLevel" => Ok(ItemSortKey::StockLevel),
            "price" => Ok(ItemSortKey::Price),
            "lastUpdated" => Ok(ItemSortKey::LastUpdated),
            other => Err(DomainError::validation(format!(
                "unknown item sort field: {other}"
            ))),
        }
    }
}

/// Sortable stock-update fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockUpdateSortKey {
    #[default]
    CreatedAt,
    OldQuantity,
    NewQuantity,
}

impl StockUpdateSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockUpdateSortKey::CreatedAt => "createdAt",
            StockUpdateSortKey::OldQuantity => "oldQuantity",
            StockUpdateSortKey::NewQuantity => "newQuantity",
        }
    }
}

impl FromStr for StockUpdateSortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(StockUpdateSortKey::CreatedAt),
            "oldQuantity" => Ok(StockUpdateSortKey::OldQuantity),
            "newQuantity" => Ok(StockUpdateSortKey::NewQuantity),
            other => Err(DomainError::validation(format!(
                "unknown stock update sort field: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_sort_parses_field_and_direction() {
        let sort = ItemSort::parse("quantity:asc").unwrap();
        assert_eq!(sort.key, ItemSortKey::Quantity);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn default_sorts_are_newest_first() {
        assert_eq!(
            ItemSort::default(),
            Sort {
                key: ItemSortKey::LastUpdated,
                direction: SortDirection::Desc
            }
        );
        assert_eq!(
            StockUpdateSort::default(),
            Sort {
                key: StockUpdateSortKey::CreatedAt,
                direction: SortDirection::Desc
            }
        );
    }

    #[test]
    fn missing_direction_is_rejected() {
        let err = ItemSort::parse("name").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_field_or_direction_is_rejected() {
        assert!(ItemSort::parse("ownerId:asc").is_err());
        assert!(ItemSort::parse("name:upwards").is_err());
        assert!(StockUpdateSort::parse("notes:desc").is_err());
    }

    #[test]
    fn parse_or_default_uses_the_entity_default() {
        let sort = StockUpdateSort::parse_or_default(None).unwrap();
        assert_eq!(sort.key, StockUpdateSortKey::CreatedAt);
        let sort = StockUpdateSort::parse_or_default(Some("oldQuantity:asc")).unwrap();
        assert_eq!(sort.key, StockUpdateSortKey::OldQuantity);
        assert_eq!(sort.direction, SortDirection::Asc);
    }
}
