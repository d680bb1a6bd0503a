//! HTTP surface: router assembly, shared state, and response plumbing.

pub mod error;
pub mod handlers;
pub mod middleware;

pub use error::ApiError;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware as axum_middleware};
use sqlx::Error as SqlxError;

use crate::application::benchmark::BenchmarkRunner;
use crate::application::error::ErrorReport;
use crate::application::listing::ListingService;
use crate::infra::db::PostgresItems;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct ApiState {
    pub listing: Arc<ListingService>,
    pub benchmark: Arc<BenchmarkRunner>,
    pub db: Arc<PostgresItems>,
    /// Upper bound for the `limit` query parameter, from configuration.
    pub max_limit: u32,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/items", get(handlers::list_items))
        .route("/items/benchmark", get(handlers::run_benchmark))
        .route("/_health/db", get(handlers::db_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
