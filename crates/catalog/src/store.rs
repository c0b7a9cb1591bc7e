use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{CarId, CatalogEntry, NewCatalogEntry},
    error::CatalogError,
};

/// Persistent home of every catalog entry.
///
/// Every write either commits fully or fails; `save_entries` commits all of
/// its entries in one transaction.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_entries(&self, entries: &[NewCatalogEntry]) -> Result<Vec<CarId>>;
    async fn find_by_mark(&self, mark: &str) -> Result<Option<CatalogEntry>>;
    /// Entries with `my_choice` set. More than one only if the data was
    /// seeded that way.
    async fn find_favorites(&self) -> Result<Vec<CatalogEntry>>;
    /// Writes the mutable attributes of `entry`.
    async fn save_entry(&self, entry: &CatalogEntry) -> Result<()>;
    async fn save_entries(&self, entries: &[CatalogEntry]) -> Result<()>;
    async fn list_marks(&self) -> Result<Vec<String>>;
    async fn count_entries(&self) -> Result<i64>;
    async fn is_data_loaded(&self) -> Result<bool>;
    async fn set_data_loaded(&self, loaded: bool) -> Result<()>;
}

pub(crate) fn persistence(err: anyhow::Error) -> CatalogError {
    CatalogError::Persistence(format!("{err:#}"))
}
