//! Shamba Checkout Server
//!
//! A headless order/payment backend for a farm-produce storefront, driving
//! M-Pesa STK push payments.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::Config;
use server::{build_router, run_server};
use shamba_core::mpesa::MpesaClient;
use shamba_core::service::OrderService;
use shamba_core::store::MemoryOrderStore;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Shamba Checkout - headless M-Pesa order/payment backend
#[derive(Parser, Debug)]
#[command(name = "shamba-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Override the listen address (e.g., 0.0.0.0:3001)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a local .env before reading the environment
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting shamba-server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    tracing::info!("Configuration loaded from environment");

    // Wire the service: in-memory store, live Daraja gateway
    let store = Arc::new(MemoryOrderStore::new());
    let gateway = Arc::new(MpesaClient::new(config.mpesa.clone()));
    let service = Arc::new(OrderService::new(store, gateway));

    let state = AppState::new(service, &config.admin_token);
    let router = build_router(state);

    tracing::info!("Starting HTTP server on {}", config.listen);
    run_server(router, config.listen).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
