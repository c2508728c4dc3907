//! Facility comparison HTTP server.
//!
//! Loads configuration, builds the facility repository, sets up the HTTP
//! router and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # In-memory repository seeded from a fixture file
//! FACILITY_SEED_FILE=facilities.json cargo run --bin facility-compare-server
//!
//! # Listing REST API
//! FACILITY_API_URL=http://localhost:3000 cargo run --bin facility-compare-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `SESSION_TTL_SECS`: Idle session lifetime (default: 1800)
//! - `REPOSITORY_TYPE`: `local` or `rest`
//! - `FACILITY_API_URL`: Listing API root (selects the REST repository)
//! - `FACILITY_SEED_FILE`: JSON fixture for the local repository
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use facility_compare::config::AppConfig;
use facility_compare::db::RepositoryFactory;
use facility_compare::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting facility comparison server");

    let config = AppConfig::load()?;
    let repository = RepositoryFactory::create(&config)?;
    match repository.health_check().await {
        Ok(true) => info!(repository = %config.repository.repo_type, "Repository initialized successfully"),
        Ok(false) => tracing::warn!("Repository reports unhealthy; comparisons will degrade"),
        Err(e) => tracing::warn!("Repository health check failed: {}", e),
    }

    let state = AppState::with_session_ttl(repository, config.session_ttl());
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(sessions.ttl().max(std::time::Duration::from_secs(1)));
        loop {
            sweep.tick().await;
            sessions.purge_expired();
        }
    });
    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
