use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use stockroom_api::app::{build_app, services::AppServices};
use stockroom_api::config::AppConfig;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let cfg = AppConfig::load().context("loading configuration")?;

    let services = Arc::new(
        AppServices::from_config(&cfg)
            .await
            .context("initialising stores")?,
    );

    if let Some((email, password)) = cfg.bootstrap_admin() {
        services
            .bootstrap_admin(email, password)
            .await
            .context("bootstrapping super admin")?;
    }

    tokio::spawn(purge_sessions(services.clone()));

    let app = build_app(services);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn purge_sessions(services: Arc<AppServices>) {
    let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        match services.auth.purge_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "purged expired sessions"),
            Err(e) => warn!(error = %e, "session purge failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
