mod auth;
mod config;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod router;
mod seed;
mod state;

use anyhow::{Context, bail};
use auth::{Role, issue_token};
use order_engine::MemoryStore;
use router::create_router;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use types::ids::CustomerId;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cfg = config::load_config()?;
    init_tracing();

    // `gateway token <customerId> [CUSTOMER|ADMIN]` prints a bearer token and exits
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("token") {
        return print_token(&cfg.jwt_secret, &args[1..]);
    }

    tracing::info!("Starting Gateway API service");

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &cfg.seed_file {
        let rows = seed::load_seed_file(path)?;
        let count = seed::apply_seed(&store, rows)?;
        tracing::info!(path = %path.display(), count, "Seeded opening balances");
    }

    let state = AppState::new(store, &cfg.jwt_secret, cfg.rate_limit);
    let app = create_router(state);

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!("Listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

fn print_token(secret: &str, args: &[String]) -> anyhow::Result<()> {
    let Some(customer) = args.first() else {
        bail!("usage: gateway token <customerId> [CUSTOMER|ADMIN]");
    };
    let role = match args.get(1).map(String::as_str) {
        None | Some("CUSTOMER") => Role::CUSTOMER,
        Some("ADMIN") => Role::ADMIN,
        Some(other) => bail!("unknown role {other}"),
    };
    let token = issue_token(secret, &CustomerId::try_new(customer.as_str())?, role, chrono::Duration::hours(12))?;
    println!("{token}");
    Ok(())
}
