use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use ibft_metrics::{export, SharedRegistry};

pub async fn serve(listen_addr: SocketAddr, registry: SharedRegistry) {
    let app = Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(registry);

    let listener = match TcpListener::bind(listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%listen_addr, "Failed to bind metrics server: {e}");
            return;
        }
    };

    info!(address = %listen_addr, "Serving metrics");

    if let Err(e) = axum::serve(listener, app).await {
        error!("Metrics server stopped: {e}");
    }
}

async fn get_metrics(State(registry): State<SharedRegistry>) -> String {
    let mut buf = String::new();

    if let Err(e) = export(&registry, &mut buf) {
        error!("Failed to encode metrics: {e}");
    }

    buf
}
