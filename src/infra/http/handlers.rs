//! Listing and benchmark request handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};

use crate::application::benchmark::{BenchmarkOptions, RawBenchmarkParams};
use crate::application::pagination::{ListingRequest, RawListingParams};

use super::error::{ApiError, repo_to_api};
use super::{ApiState, db_health_response};

/// `GET /items`: validate pagination parameters, then serve the page
/// through the listing service (cache-aware when `turbo=true`).
pub async fn list_items(
    State(state): State<ApiState>,
    Query(raw): Query<RawListingParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = ListingRequest::from_raw(&raw, state.max_limit)?;
    let page = state.listing.find_all(request).await.map_err(repo_to_api)?;
    Ok(Json(page))
}

/// `GET /items/benchmark`: run a self-contained load generation pass and
/// report throughput. Responses are marked uncacheable so repeated runs
/// always reach the server.
pub async fn run_benchmark(
    State(state): State<ApiState>,
    Query(raw): Query<RawBenchmarkParams>,
) -> Result<Response, ApiError> {
    let options = BenchmarkOptions::from_raw(&raw)?;
    let report = state.benchmark.run(options).await?;

    let mut response = Json(report).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(response)
}

pub async fn db_health(State(state): State<ApiState>) -> Response {
    db_health_response(state.db.health_check().await)
}
