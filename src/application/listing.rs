//! Listing orchestration: cache consultation and store delegation.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::application::pagination::ListingRequest;
use crate::application::repos::{ItemsRepo, RepoError};
use crate::cache::{ListingCache, listing_key};
use crate::domain::items::ItemRecord;

/// Response envelope for one listing call. `limit`, `offset` and `afterId`
/// echo the request for client bookkeeping; `offset` is echoed even when a
/// cursor made the store ignore it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingPage {
    pub data: Vec<ItemRecord>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
    #[serde(rename = "afterId")]
    pub after_id: Option<i64>,
}

#[derive(Clone)]
pub struct ListingService {
    items: Arc<dyn ItemsRepo>,
    cache: Arc<ListingCache>,
}

impl ListingService {
    pub fn new(items: Arc<dyn ItemsRepo>, cache: Arc<ListingCache>) -> Self {
        Self { items, cache }
    }

    /// Serve one validated listing request.
    ///
    /// Turbo requests consult the cache first and populate it after a store
    /// round trip; non-turbo requests always reach the store, and neither
    /// mode splits the key namespace. Store errors propagate unretried.
    pub async fn find_all(&self, request: ListingRequest) -> Result<ListingPage, RepoError> {
        let key = listing_key(request.limit(), request.offset(), request.after_id());

        if request.turbo()
            && let Some(page) = self.cache.get(&key)
        {
            debug!(target = "scaffale::listing", key = %key, "serving cached page");
            return Ok(page);
        }

        let fetched = self.items.query_page(request.selection()).await?;
        let page = ListingPage {
            data: fetched.items,
            total: fetched.total,
            limit: request.limit(),
            offset: request.offset(),
            after_id: request.after_id(),
        };

        if request.turbo() {
            self.cache.insert(key, page.clone());
        }

        Ok(page)
    }
}
