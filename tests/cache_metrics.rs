use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use time::OffsetDateTime;

use scaffale::application::benchmark::{BenchmarkOptions, BenchmarkRunner};
use scaffale::application::listing::{ListingPage, ListingService};
use scaffale::application::pagination::PageSelection;
use scaffale::application::repos::{ItemPage, ItemsRepo, RepoError};
use scaffale::cache::{CacheConfig, ListingCache, listing_key};
use scaffale::domain::items::ItemRecord;

struct StaticItemsRepo;

#[async_trait]
impl ItemsRepo for StaticItemsRepo {
    async fn count_items(&self) -> Result<u64, RepoError> {
        Ok(1)
    }

    async fn query_page(&self, _selection: PageSelection) -> Result<ItemPage, RepoError> {
        Ok(ItemPage {
            items: vec![ItemRecord {
                id: 1,
                name: "Item #1".to_string(),
                created_at: OffsetDateTime::now_utc(),
            }],
            total: 1,
        })
    }

    async fn insert_items(&self, _names: &[String]) -> Result<(), RepoError> {
        Ok(())
    }
}

// Any page value works; the store never inspects it.
fn sample_page() -> ListingPage {
    ListingPage {
        data: Vec::new(),
        total: 0,
        limit: 10,
        offset: 0,
        after_id: None,
    }
}

#[tokio::test]
async fn cache_and_benchmark_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Hit, miss, and capacity eviction through a two-entry cache.
    let fresh = ListingCache::new(&CacheConfig {
        ttl: Duration::from_secs(10),
        max_entries: 2,
    });
    let page = sample_page();
    assert!(fresh.get(&listing_key(10, 0, None)).is_none());
    fresh.insert(listing_key(10, 0, None), page.clone());
    assert!(fresh.get(&listing_key(10, 0, None)).is_some());
    fresh.insert(listing_key(10, 10, None), page.clone());
    fresh.insert(listing_key(10, 20, None), page.clone());
    assert_eq!(fresh.len(), 2);

    // Expiry with an already-elapsed TTL.
    let stale = ListingCache::new(&CacheConfig {
        ttl: Duration::ZERO,
        max_entries: 2,
    });
    stale.insert(listing_key(5, 0, None), page.clone());
    assert!(stale.get(&listing_key(5, 0, None)).is_none());

    // Benchmark duration histogram.
    let cache = Arc::new(ListingCache::new(&CacheConfig {
        ttl: Duration::from_secs(10),
        max_entries: 64,
    }));
    let listing = Arc::new(ListingService::new(Arc::new(StaticItemsRepo), cache));
    let runner = BenchmarkRunner::new(listing, NonZeroU32::new(1000).expect("limit is non-zero"));
    runner
        .run(BenchmarkOptions {
            turbo: true,
            count: 5,
            concurrency: 2,
        })
        .await
        .unwrap_or_else(|err| panic!("benchmark must run: {err}"));

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "scaffale_cache_hit_total",
        "scaffale_cache_miss_total",
        "scaffale_cache_expired_total",
        "scaffale_cache_evict_total",
        "scaffale_benchmark_duration_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
