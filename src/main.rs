use std::net::SocketAddr;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use shopq_backend::config::Config;
use shopq_backend::state::AppState;
use shopq_backend::{build_app, database};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    let store = match database::connect(&config.database_url).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open the store");
            return;
        }
    };

    let (host, base_port) = (config.host, config.port);
    let app = build_app(AppState::new(store, config));

    // Try base_port..base_port+20 so a busy port does not abort startup
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let addr = SocketAddr::from((host, base_port.saturating_add(offset)));
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    bound = Some((l, addr));
                    break;
                }
                Err(e) => {
                    if offset == 0 {
                        tracing::warn!(%addr, error = %e, "Port in use, trying next");
                    }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
    }
}
