mod app;
mod response;
mod views;

use anyhow::Context;
use hybrid_router::{Config, InstanceStore};
use tracing::{info, warn};

use crate::app::{build_app, describe_mount, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = Config::load_default().unwrap_or_else(|e| {
        warn!("Failed to load config: {:#}, using defaults", e);
        Config::default()
    });

    if config.mounts.is_empty() {
        info!("No mounts configured, serving the demo views");
        config.mounts = views::demo_mounts();
    }

    let state = AppState::from_config(&config)?;
    info!("Instances kept in the {} store", state.store().name());
    for codec in state.table().mounts() {
        info!("  {}", describe_mount(codec));
    }

    let app = build_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
