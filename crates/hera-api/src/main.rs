//! # hera-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Binds to `PORT` (default 8080).

use hera_api::state::{AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();
    tracing::info!(?config, "configuration loaded");
    let port = config.port;

    // A missing RPC configuration is not fatal: catalog routes still work
    // and RPC-backed routes answer 503.
    let client = match hera_rpc_client::RpcConfig::from_env() {
        Ok(rpc_config) => {
            tracing::info!(url = %rpc_config.supabase_url, "RPC client configured");
            match hera_rpc_client::HeraClient::new(rpc_config) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::error!("Failed to create RPC client: {e}");
                    return Err(e.into());
                }
            }
        }
        Err(e) => {
            tracing::warn!("RPC client not configured: {e}. RPC-backed endpoints will return 503.");
            None
        }
    };

    let state = AppState::with_config(config, client).map_err(|e| {
        tracing::error!("Failed to load presets or navigation: {e}");
        e
    })?;
    tracing::info!(
        presets = state.registry.len(),
        navigation_entries = state.navigation.len(),
        "catalogs loaded"
    );

    let app = hera_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HERA API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` filter (default `info`); `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
