use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use dealstack::{
    application::{
        audit::ClickAudit, clicks::ClickService, listing::ListingService, navigator::Navigator,
        offers::OfferResolver,
    },
    config,
    infra::{
        db::PgRepositories,
        error::InfraError,
        http::api::{ApiState, build_api_router, rate_limit::ClickRateLimiter},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_startup_error(&error);
        process::exit(1);
    }
}

fn report_startup_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "startup error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "startup error");
    });
}

async fn run() -> Result<(), InfraError> {
    let (_cli, settings) = config::load_with_cli()
        .map_err(|err| InfraError::server(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let pool = PgRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| InfraError::database(format!("failed to connect: {err}")))?;
    PgRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(format!("failed to run migrations: {err}")))?;
    let repositories = Arc::new(PgRepositories::new(pool));

    let navigator = Navigator::new(
        settings.pagination.default_limit.get(),
        settings.pagination.api_base.clone(),
        settings.pagination.canonical_origin.clone(),
    );

    let listing = Arc::new(ListingService::new(
        repositories.clone(),
        repositories.clone(),
        repositories.clone(),
        repositories.clone(),
        navigator,
        settings.cache.list_ttl,
        settings.pagination.homepage_limit.get(),
    ));

    let (audit, _audit_worker) = ClickAudit::spawn(
        repositories.clone(),
        settings.clicks.audit_queue_capacity.get(),
    );
    let resolver = OfferResolver::new(repositories.clone(), repositories.clone());
    let clicks = Arc::new(ClickService::new(
        resolver,
        repositories.clone(),
        repositories.clone(),
        audit,
    ));

    let rate_limiter = Arc::new(ClickRateLimiter::new(
        settings.rate_limit.window,
        settings.rate_limit.max_clicks.get(),
        settings.rate_limit.table_capacity,
    ));

    let state = ApiState {
        listing,
        clicks,
        rate_limiter,
    };
    let router = build_api_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| InfraError::server(format!("failed to bind listener: {err}")))?;
    info!(addr = %settings.server.addr, "dealstack API listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
    .await
    .map_err(|err| InfraError::server(format!("server error: {err}")))?;

    info!("dealstack API stopped");
    Ok(())
}

async fn shutdown_signal(drain: std::time::Duration) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(error = %error, "failed to install shutdown handler");
        return;
    }
    info!(drain_secs = drain.as_secs(), "shutdown requested, draining");
}
