//! Query DTOs and their mapping onto the typed domain options.
//!
//! Bodies deserialize straight into the domain payload types (`NewItem`,
//! `ItemPatch`, `StockAdjustment`), which already carry the camelCase wire
//! shape. What needs mapping is the query string: filters arrive as raw
//! strings and are parsed against the closed domain sets here, so a bad
//! `category` or `sortBy` fails with the same error taxonomy as everything
//! else.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use pantry_core::{DomainError, DomainResult, PageRequest};
use pantry_inventory::{ItemFilter, ItemSort, StockUpdateFilter, StockUpdateSort};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQuery {
    pub category: Option<String>,
    pub stock_level: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

impl ListItemsQuery {
    pub fn into_options(self) -> DomainResult<(ItemFilter, ItemSort, PageRequest)> {
        let filter = ItemFilter {
            category: self.category.as_deref().map(str::parse).transpose()?,
            stock_level: self.stock_level.as_deref().map(str::parse).transpose()?,
            search: self.search,
        };
        let sort = ItemSort::parse_or_default(self.sort_by.as_deref())?;
        let page = PageRequest::from_params(self.page, self.limit)?;
        Ok((filter, sort, page))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStockUpdatesQuery {
    pub item_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

impl ListStockUpdatesQuery {
    pub fn into_options(self) -> DomainResult<(StockUpdateFilter, StockUpdateSort, PageRequest)> {
        let filter = StockUpdateFilter {
            item_id: self.item_id.as_deref().map(str::parse).transpose()?,
            start_date: parse_date("startDate", self.start_date.as_deref())?,
            end_date: parse_date("endDate", self.end_date.as_deref())?,
        };
        let sort = StockUpdateSort::parse_or_default(self.sort_by.as_deref())?;
        let page = PageRequest::from_params(self.page, self.limit)?;
        Ok((filter, sort, page))
    }
}

/// Pagination/sort options for the per-item history listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListForItemQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

impl ListForItemQuery {
    pub fn into_options(self) -> DomainResult<(StockUpdateSort, PageRequest)> {
        let sort = StockUpdateSort::parse_or_default(self.sort_by.as_deref())?;
        let page = PageRequest::from_params(self.page, self.limit)?;
        Ok((sort, page))
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> DomainResult<Option<DateTime<Utc>>> {
    raw.map(|s| {
        s.parse::<DateTime<Utc>>().map_err(|_| {
            DomainError::validation(format!("{field} must be an RFC 3339 timestamp"))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::SortDirection;
    use pantry_inventory::{Category, ItemSortKey, StockLevel};

    #[test]
    fn item_query_parses_filters_against_the_closed_sets() {
        let query = ListItemsQuery {
            category: Some("rice".to_string()),
            stock_level: Some("low".to_string()),
            search: Some("basmati".to_string()),
            page: Some(2),
            limit: Some(5),
            sort_by: Some("name:asc".to_string()),
        };
        let (filter, sort, page) = query.into_options().unwrap();
        assert_eq!(filter.category, Some(Category::Rice));
        assert_eq!(filter.stock_level, Some(StockLevel::Low));
        assert_eq!(sort.key, ItemSortKey::Name);
        assert_eq!(sort.direction, SortDirection::Asc);
        assert_eq!(page.page(), 2);
        assert_eq!(page.limit(), 5);
    }

    #[test]
    fn unknown_category_is_a_validation_error() {
        let query = ListItemsQuery {
            category: Some("electronics".to_string()),
            ..ListItemsQuery::default()
        };
        assert!(matches!(
            query.into_options().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn malformed_item_id_filter_is_an_invalid_id_error() {
        let query = ListStockUpdatesQuery {
            item_id: Some("not-a-uuid".to_string()),
            ..ListStockUpdatesQuery::default()
        };
        assert!(matches!(
            query.into_options().unwrap_err(),
            DomainError::InvalidId(_)
        ));
    }

    #[test]
    fn dates_must_be_rfc3339() {
        let query = ListStockUpdatesQuery {
            start_date: Some("2025-01-15T00:00:00Z".to_string()),
            end_date: Some("last tuesday".to_string()),
            ..ListStockUpdatesQuery::default()
        };
        let err = query.into_options().unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("endDate must be an RFC 3339 timestamp")
        );
    }

    #[test]
    fn empty_queries_fall_back_to_defaults() {
        let (filter, sort, page) = ListItemsQuery::default().into_options().unwrap();
        assert_eq!(filter, ItemFilter::default());
        assert_eq!(sort, ItemSort::default());
        assert_eq!(page, PageRequest::default());
    }
}
