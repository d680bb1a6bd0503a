//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageSelection;
use crate::domain::items::ItemRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// One fetched page together with the total count for the mode's filter:
/// the full table count in offset mode, the count of rows past the cursor
/// in key-set mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPage {
    pub items: Vec<ItemRecord>,
    pub total: u64,
}

#[async_trait]
pub trait ItemsRepo: Send + Sync {
    /// Total row count. Drives the seeding skip decision.
    async fn count_items(&self) -> Result<u64, RepoError>;

    /// Fetch one page in the selected mode, ordered ascending by id,
    /// regardless of physical storage order.
    async fn query_page(&self, selection: PageSelection) -> Result<ItemPage, RepoError>;

    /// Bulk-insert named items; ids and creation timestamps are
    /// store-assigned.
    async fn insert_items(&self, names: &[String]) -> Result<(), RepoError>;
}
