//! Run command - HTTP server plus the daily scheduler

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use super::RunArgs;
use crate::api::create_router;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::traits::Database;
use crate::infrastructure::logging;
use crate::infrastructure::storage::InMemoryDatabase;

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging, args.debug);

    let addr = build_socket_addr(&config, &args)?;

    if args.in_memory {
        info!("Using the in-memory store, data is lost on exit");
        let context = AppContext::new(config, Arc::new(InMemoryDatabase::new()))?;
        serve(context, addr, &args).await
    } else {
        let context = AppContext::connect(config).await?;
        serve(context, addr, &args).await
    }
}

async fn serve<D: Database>(
    mut context: AppContext<D>,
    addr: SocketAddr,
    args: &RunArgs,
) -> anyhow::Result<()> {
    context.start();

    let app = create_router(context.state(args.debug));

    info!(%addr, workers = args.workers, debug = args.debug, "Starting API server");
    let listener = TcpListener::bind(addr).await?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    context.shutdown().await;
    served?;

    info!("API server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

/// Command line host/port win over the configured server section
fn build_socket_addr(config: &AppConfig, args: &RunArgs) -> anyhow::Result<SocketAddr> {
    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);

    Ok(SocketAddr::from((host.parse::<std::net::IpAddr>()?, port)))
}
