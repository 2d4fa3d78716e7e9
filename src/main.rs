//! gridscale - an in-memory land value downscaling server
//!
//! This is the main entry point for the gridscale application.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::{error, info};

use gridscale::logging::{log_error, log_load_stats, log_operation_end, log_operation_start};
use gridscale::{init_tracing, AppState, Config, Downscaler, GridscaleError, Result, SquareGrid};

fn main() -> Result<()> {
    let (config, data_path) = Config::load()?;

    init_tracing(&config.log_level);
    info!("Starting gridscale v{}", env!("CARGO_PKG_VERSION"));

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.server.workers {
        builder.worker_threads(workers);
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(serve(config, data_path))
}

async fn serve(config: Config, data_path: std::path::PathBuf) -> Result<()> {
    let display_path = data_path.display().to_string();
    let start = Instant::now();
    log_operation_start("data_load", Some(&display_path));

    let loaded = Downscaler::load(
        &data_path,
        &config.data,
        Arc::new(SquareGrid::new()),
        config.interpolation.clone(),
    );
    log_operation_end("data_load", start, loaded.is_ok());

    let downscaler = loaded.map_err(|e| {
        log_error(&e, "data_load");
        e
    })?;

    log_load_stats(
        &display_path,
        downscaler.cell_count(),
        &downscaler.load_stats(),
        downscaler.coverage(),
    );
    info!(
        method = downscaler.method(),
        neighbors = config.interpolation.neighbors,
        power = config.interpolation.power,
        "Interpolator ready"
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| GridscaleError::Config {
                message: format!("Invalid host address: {}", e),
            })?,
        config.server.port,
    ));

    let state = AppState::new_shared(config, downscaler, display_path);
    let app = gridscale::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GridscaleError::Server {
            message: format!("Failed to bind to address {}: {}", addr, e),
        })?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            let e = GridscaleError::Server {
                message: format!("Server error: {}", e),
            };
            log_error(&e, "serve");
            e
        })?;

    info!("Server has been gracefully shut down");
    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
