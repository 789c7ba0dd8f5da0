//! URL proxy entry point
//!
//! Serves the `/check/<b64url>` interstitial (see [`handler`]) plus a
//! static asset tree, backed by three threat providers (see
//! `threat_providers`) that are initialized eagerly at startup and shut
//! down cleanly on `SIGINT`/ctrl-c.

mod config;
mod error;
mod handler;
mod state;
mod templates;

use axum::Router;
use axum::routing::get;
use threat_providers::{HostedProvider, phishtank_provider, urlhaus_provider};
use tower_http::services::ServeDir;

use config::ProxyConfig;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ProxyConfig::load_from_env()?;

    let state = AppState::new(
        urlhaus_provider(),
        phishtank_provider(),
        HostedProvider::new(config.sb_api_key.clone()),
        config.host.clone(),
    );

    tracing::info!("initializing threat providers");
    state.init_all().await?;
    tracing::info!("threat providers ready");

    let app = Router::new()
        .route("/check/{encoded}", get(handler::check))
        .route("/check/", get(handler::missing_url))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(addr = %config.bind, "url-proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down threat providers");
    state.shutdown_all().await;

    Ok(())
}

/// Waits for ctrl-c (or, on unix, SIGTERM) so `axum::serve`'s graceful
/// shutdown can drain in-flight requests before `main` tears down the
/// threat providers' refresh loops.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
