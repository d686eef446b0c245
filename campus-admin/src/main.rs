use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use campus_admin::repository::connect_postgres;
use campus_admin::{build_router, in_memory_state, AdminConfig, AppState, InMemoryRepository};
use campus_filters::InMemorySessionBackend;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if let Err(err) = campus_core::logging::init_tracing(None) {
        eprintln!("failed to initialise tracing: {err}");
    }

    let config = AdminConfig::from_env().context("failed to load admin configuration")?;
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("invalid bind address")?;

    let state = if config.core.database_url().is_some() {
        let (users, issues) = connect_postgres(&config.core)
            .await
            .context("failed to connect to Postgres")?;
        AppState::new(
            Arc::new(users),
            Arc::new(issues),
            Arc::new(InMemorySessionBackend::new()),
            config.clone(),
        )
    } else if config.core.is_production() {
        bail!("DATABASE_URL is required in production");
    } else {
        warn!("DATABASE_URL not set; serving in-memory records");
        in_memory_state(config.clone(), InMemoryRepository::new())
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    let actual_addr = listener
        .local_addr()
        .context("failed to read socket address")?;
    info!(%actual_addr, node = %config.core.node_name, "starting campus-admin");

    if let Err(err) = axum::serve(listener, build_router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?err, "campus-admin terminated with error");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
