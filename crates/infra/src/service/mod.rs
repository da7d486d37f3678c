//! Application services coordinating domain rules with storage.

pub mod items;
pub mod stock_updates;

pub use items::ItemService;
pub use stock_updates::StockUpdateService;

use pantry_core::DomainError;

use crate::store::StoreError;

/// Errors surfaced by the services.
///
/// [`StoreError::Conflict`] folds into [`DomainError::Conflict`] on the way
/// through; only genuine backend failures stay in the `Store` variant.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The storage backend failed; not a caller mistake.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
