//! Built-in load generator for the listing read path.
//!
//! Fans synthetic requests out through the listing service with a bounded
//! number in flight, waits for every request to settle, and reports
//! wall-clock throughput.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::{StreamExt, stream};
use metrics::histogram;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::listing::ListingService;
use crate::application::pagination::{ListingRequest, ValidationError, parse_bool_param};

const METRIC_BENCHMARK_DURATION_MS: &str = "scaffale_benchmark_duration_ms";

/// Page size requested by every synthetic call.
const BENCH_LIMIT: u32 = 50;
/// Synthetic offsets are drawn uniformly from `[0, BENCH_OFFSET_SPREAD)`.
const BENCH_OFFSET_SPREAD: u64 = 20;

pub const DEFAULT_BENCH_COUNT: u32 = 1000;
pub const DEFAULT_BENCH_CONCURRENCY: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct BenchmarkOptions {
    pub turbo: bool,
    pub count: u32,
    pub concurrency: u32,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            turbo: false,
            count: DEFAULT_BENCH_COUNT,
            concurrency: DEFAULT_BENCH_CONCURRENCY,
        }
    }
}

/// Query parameters as received on the wire, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBenchmarkParams {
    pub turbo: Option<String>,
    pub count: Option<String>,
    pub concurrency: Option<String>,
}

impl BenchmarkOptions {
    /// Parse raw query strings, rejecting anything that is not an explicit
    /// boolean or integer. Absent parameters fall back to defaults.
    pub fn from_raw(raw: &RawBenchmarkParams) -> Result<Self, ValidationError> {
        let turbo = match raw.turbo.as_deref() {
            Some(value) => parse_bool_param(value)
                .ok_or_else(|| ValidationError::new("turbo", "must be a boolean"))?,
            None => false,
        };

        let count = match raw.count.as_deref() {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ValidationError::new("count", "must be a non-negative integer"))?,
            None => DEFAULT_BENCH_COUNT,
        };

        let concurrency = match raw.concurrency.as_deref() {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ValidationError::new("concurrency", "must be a positive integer"))?,
            None => DEFAULT_BENCH_CONCURRENCY,
        };
        if concurrency == 0 {
            return Err(ValidationError::new("concurrency", "must be at least 1"));
        }

        Ok(Self {
            turbo,
            count,
            concurrency,
        })
    }
}

/// Aggregate outcome of one benchmark run. `duration` is wall-clock
/// milliseconds formatted to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub requests: u32,
    pub concurrency: u32,
    pub duration: String,
    pub rps: u64,
    pub failures: u64,
    pub turbo: bool,
    pub message: &'static str,
}

pub struct BenchmarkRunner {
    listing: Arc<ListingService>,
    max_limit: u32,
}

impl BenchmarkRunner {
    pub fn new(listing: Arc<ListingService>, max_limit: NonZeroU32) -> Self {
        Self {
            listing,
            max_limit: max_limit.get(),
        }
    }

    /// Drive `count` synthetic listing calls with at most `concurrency` in
    /// flight, settle them all, and aggregate timing.
    ///
    /// Individual request failures never abort the batch; they are counted
    /// and reported, not distinguished further.
    pub async fn run(&self, options: BenchmarkOptions) -> Result<BenchmarkReport, ValidationError> {
        if options.concurrency == 0 {
            return Err(ValidationError::new("concurrency", "must be at least 1"));
        }

        // Page size is clamped to the configured listing ceiling.
        let limit = BENCH_LIMIT.min(self.max_limit);

        let requests = {
            let mut rng = rand::rng();
            (0..options.count)
                .map(|_| {
                    let offset = rng.random_range(0..BENCH_OFFSET_SPREAD);
                    ListingRequest::new(limit, offset, options.turbo, None, self.max_limit)
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let failures = Arc::new(AtomicU64::new(0));
        let failure_handle = failures.clone();
        let listing = self.listing.clone();

        let started = Instant::now();
        stream::iter(requests)
            .for_each_concurrent(Some(options.concurrency as usize), move |request| {
                let listing = listing.clone();
                let failures = failure_handle.clone();
                async move {
                    if listing.find_all(request).await.is_err() {
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_BENCHMARK_DURATION_MS).record(duration_ms);

        let failures = failures.load(Ordering::Relaxed);
        let report = BenchmarkReport {
            requests: options.count,
            concurrency: options.concurrency,
            duration: format!("{duration_ms:.2}"),
            rps: compute_rps(options.count, duration_ms),
            failures,
            turbo: options.turbo,
            message: if options.turbo {
                "Turbo (in-memory cache)"
            } else {
                "Slow (database only)"
            },
        };

        info!(
            target = "scaffale::benchmark",
            requests = report.requests,
            concurrency = report.concurrency,
            turbo = report.turbo,
            duration_ms = %report.duration,
            rps = report.rps,
            failures = report.failures,
            "Benchmark settled"
        );

        Ok(report)
    }
}

/// Requests per second, rounded to the nearest integer; zero for a
/// degenerate instant run instead of dividing by zero.
fn compute_rps(count: u32, duration_ms: f64) -> u64 {
    if duration_ms > 0.0 {
        (f64::from(count) / duration_ms * 1000.0).round() as u64
    } else {
        0
    }
}
