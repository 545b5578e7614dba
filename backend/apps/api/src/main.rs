//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use auth::{AuthAppState, PgAuthRepository, auth_router};
use axum::{
    Router,
    extract::Request,
    http::{self, Method, header},
    routing::get,
};
use chrono::Utc;
use collect::{CollectAppState, PgCollectRepository, SolanaChainGateway};
use kernel::time::{Clock, SystemClock};
use platform::rate_limit::PgRateLimitStore;
use platform::solana::RpcClient;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Rate-limit counter rows older than this are deleted
const RATE_LIMIT_RETENTION: chrono::Duration = chrono::Duration::days(2);

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,collect=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Expired challenges and stale counters, at startup and then hourly
    let cleanup_pool = pool.clone();
    spawn_periodic(CLEANUP_INTERVAL, move || cleanup_expired(cleanup_pool.clone()));

    let collect_repo = PgCollectRepository::new(pool.clone());
    match collect_repo.count_pending().await {
        Ok(pending) => tracing::info!(pending, "Pending collection requests awaiting reconciliation"),
        Err(e) => tracing::warn!(error = %e, "Could not count pending collection requests"),
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Auth
    let auth_state = AuthAppState::new(
        PgAuthRepository::new(pool.clone()),
        PgRateLimitStore::new(pool.clone()),
        config.auth,
        clock.clone(),
    );

    // Chain gateway
    let chain = config.chain;
    let rpc = RpcClient::new(&chain.rpc_url, chain.rpc_timeout, chain.commitment)
        .context("failed to build Solana RPC client")?;
    let gateway = SolanaChainGateway::new(Arc::new(rpc), Arc::new(chain.authority), chain.mint);
    tracing::info!(
        rpc_url = %chain.rpc_url,
        authority = %gateway.authority(),
        "Chain gateway ready"
    );

    // Collect
    let sweep_interval = config.collect.sweep_interval;
    let sweep_batch = config.collect.sweep_batch;
    let collect_state = CollectAppState::new(
        collect_repo,
        PgRateLimitStore::new(pool.clone()),
        gateway,
        config.collect,
        auth_state.sessions.clone(),
        clock,
    );
    let tracker = collect_state.tracker.clone();
    spawn_periodic(sweep_interval, move || {
        let tracker = tracker.clone();
        async move {
            if let Err(e) = tracker.sweep(sweep_batch).await {
                tracing::error!(error = %e, "Collection sweep failed");
            }
        }
    });

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let api = Router::new()
        .nest("/auth", auth_router(auth_state))
        .merge(collect::collect_router(collect_state));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Run `job` every `period`, starting immediately
fn spawn_periodic<F, Fut>(period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}

/// Delete expired wallet challenges and old rate-limit counters
///
/// Failures are logged and retried on the next run.
async fn cleanup_expired(pool: PgPool) {
    match PgAuthRepository::new(pool.clone()).cleanup_expired().await {
        Ok(deleted) => tracing::debug!(challenges_deleted = deleted, "Challenge cleanup completed"),
        Err(e) => tracing::warn!(error = %e, "Wallet challenge cleanup failed"),
    }

    match PgRateLimitStore::new(pool)
        .cleanup_expired(Utc::now() - RATE_LIMIT_RETENTION)
        .await
    {
        Ok(deleted) => tracing::debug!(
            counters_deleted = deleted,
            "Rate limit counter cleanup completed"
        ),
        Err(e) => tracing::warn!(error = %e, "Rate limit cleanup failed"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_periodic_job_runs_immediately_and_keeps_running() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let handle = spawn_periodic(CLEANUP_INTERVAL, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(CLEANUP_INTERVAL * 3).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);

        handle.abort();
    }
}
