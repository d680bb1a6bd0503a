use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use time::OffsetDateTime;
use tower::ServiceExt;

use scaffale::application::benchmark::BenchmarkRunner;
use scaffale::application::listing::ListingService;
use scaffale::application::pagination::PageSelection;
use scaffale::application::repos::{ItemPage, ItemsRepo, RepoError};
use scaffale::cache::{CacheConfig, ListingCache};
use scaffale::domain::items::ItemRecord;
use scaffale::infra::db::PostgresItems;
use scaffale::infra::http::{ApiState, build_router};

struct FakeItemsRepo {
    rows: Vec<ItemRecord>,
}

impl FakeItemsRepo {
    fn with_rows(count: i64) -> Self {
        Self {
            rows: (1..=count)
                .map(|id| ItemRecord {
                    id,
                    name: format!("Item #{id}"),
                    created_at: OffsetDateTime::now_utc(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ItemsRepo for FakeItemsRepo {
    async fn count_items(&self) -> Result<u64, RepoError> {
        Ok(self.rows.len() as u64)
    }

    async fn query_page(&self, selection: PageSelection) -> Result<ItemPage, RepoError> {
        let page = match selection {
            PageSelection::Offset { limit, offset } => ItemPage {
                items: self
                    .rows
                    .iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .cloned()
                    .collect(),
                total: self.rows.len() as u64,
            },
            PageSelection::Keyset { limit, after_id } => {
                let matching: Vec<ItemRecord> = self
                    .rows
                    .iter()
                    .filter(|row| row.id > after_id)
                    .cloned()
                    .collect();
                let total = matching.len() as u64;
                ItemPage {
                    items: matching.into_iter().take(limit as usize).collect(),
                    total,
                }
            }
        };
        Ok(page)
    }

    async fn insert_items(&self, _names: &[String]) -> Result<(), RepoError> {
        Ok(())
    }
}

// A pool that never reaches a server; health probes against it must fail.
fn unreachable_pool() -> sqlx::PgPool {
    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("nobody")
        .database("nothing");
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(800))
        .connect_lazy_with(options)
}

fn build_app(rows: i64) -> Router {
    let repo = Arc::new(FakeItemsRepo::with_rows(rows));
    let cache = Arc::new(ListingCache::new(&CacheConfig {
        ttl: Duration::from_secs(10),
        max_entries: 64,
    }));
    let listing = Arc::new(ListingService::new(repo, cache));
    let benchmark = Arc::new(BenchmarkRunner::new(
        listing.clone(),
        NonZeroU32::new(1000).expect("limit is non-zero"),
    ));
    let db = Arc::new(PostgresItems::new(unreachable_pool()));
    build_router(ApiState {
        listing,
        benchmark,
        db,
        max_limit: 1000,
    })
}

async fn send(app: &Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(app, uri).await;
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, json)
}

#[tokio::test]
async fn listing_returns_the_envelope() {
    let app = build_app(100);

    let (status, json) = get_json(&app, "/items?limit=5&offset=10").await;

    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().expect("data should be an array");
    assert_eq!(data.len(), 5);
    assert_eq!(data[0]["id"], 11);
    assert!(data[0]["name"].is_string());
    assert!(data[0]["created_at"].is_string());
    assert_eq!(json["total"], 100);
    assert_eq!(json["limit"], 5);
    assert_eq!(json["offset"], 10);
    assert_eq!(json["afterId"], Value::Null);
}

#[tokio::test]
async fn absent_parameters_fall_back_to_defaults() {
    let app = build_app(100);

    let (status, json) = get_json(&app, "/items").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["limit"], 50);
    assert_eq!(json["offset"], 0);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(50));
}

#[tokio::test]
async fn cursor_requests_take_precedence_over_offset() {
    let app = build_app(100);

    let (status, json) = get_json(&app, "/items?afterId=95&limit=10&offset=3").await;

    assert_eq!(status, StatusCode::OK);
    let data = json["data"].as_array().expect("data should be an array");
    assert_eq!(data.len(), 5);
    assert_eq!(data[0]["id"], 96);
    assert_eq!(json["total"], 5);
    assert_eq!(json["afterId"], 95);
    assert_eq!(json["offset"], 3);
}

#[tokio::test]
async fn invalid_parameters_get_structured_rejections() {
    let app = build_app(10);

    for uri in [
        "/items?limit=0",
        "/items?limit=1001",
        "/items?limit=abc",
        "/items?offset=-1",
        "/items?afterId=0",
        "/items?afterId=-7",
        "/items?afterId=xyz",
        "/items?turbo=maybe",
    ] {
        let (status, json) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(json["error"]["code"], "invalid_input", "uri: {uri}");
        assert!(json["error"]["hint"].is_string(), "uri: {uri}");
    }
}

#[tokio::test]
async fn turbo_repeats_serve_identical_pages() {
    let app = build_app(100);

    let (first_status, first) = get_json(&app, "/items?turbo=true&limit=5").await;
    let (second_status, second) = get_json(&app, "/items?turbo=true&limit=5").await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test]
async fn benchmark_responses_are_uncacheable() {
    let app = build_app(100);

    let response = send(&app, "/items/benchmark?count=3&turbo=true").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .expect("cache-control should be present");
    assert_eq!(cache_control, "no-store, no-cache, must-revalidate, max-age=0");
    assert_eq!(
        response
            .headers()
            .get(header::PRAGMA)
            .and_then(|value| value.to_str().ok()),
        Some("no-cache")
    );
    assert_eq!(
        response
            .headers()
            .get(header::EXPIRES)
            .and_then(|value| value.to_str().ok()),
        Some("0")
    );

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let json: Value = serde_json::from_slice(&bytes).expect("body should be JSON");
    assert_eq!(json["requests"], 3);
    assert_eq!(json["turbo"], true);
    assert_eq!(json["message"], "Turbo (in-memory cache)");
    assert_eq!(json["failures"], 0);
    assert!(json["duration"].is_string());
    assert!(json["rps"].is_u64());
}

#[tokio::test]
async fn benchmark_rejects_invalid_parameters() {
    let app = build_app(10);

    for uri in [
        "/items/benchmark?concurrency=0",
        "/items/benchmark?count=abc",
        "/items/benchmark?turbo=maybe",
    ] {
        let (status, json) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(json["error"]["code"], "invalid_input", "uri: {uri}");
    }
}

#[tokio::test]
async fn db_health_reports_unavailable_without_a_database() {
    let app = build_app(10);

    let response = send(&app, "/_health/db").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
