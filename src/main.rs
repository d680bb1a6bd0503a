use std::{process, sync::Arc};

use scaffale::{
    application::benchmark::BenchmarkRunner,
    application::error::AppError,
    application::listing::ListingService,
    application::seed::seed_items,
    cache::{CacheConfig, ListingCache},
    config,
    infra::{db::PostgresItems, error::InfraError, http, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let pool = PostgresItems::connect(&settings.database)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    PostgresItems::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    let db = Arc::new(PostgresItems::new(pool));

    seed_items(db.as_ref(), &settings.seed).await?;

    let cache = Arc::new(ListingCache::new(&CacheConfig::from(&settings.cache)));
    let listing = Arc::new(ListingService::new(db.clone(), cache));
    let benchmark = Arc::new(BenchmarkRunner::new(
        listing.clone(),
        settings.listing.max_limit,
    ));

    let state = http::ApiState {
        listing,
        benchmark,
        db,
        max_limit: settings.listing.max_limit.get(),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "scaffale::startup",
        addr = %settings.server.addr,
        "Listening for connections"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(())
}
