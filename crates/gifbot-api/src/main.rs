//! Discord interactions server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gifbot_api::{
    create_router, metrics, ApiConfig, ApiError, ApiResult, AppState, DiscordConfig,
};
use gifbot_media::ToolPaths;
use gifbot_storage::{HostUploader, LitterboxClient};
use gifbot_worker::{ConversionConfig, ConversionOrchestrator};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    init_tracing();

    if let Err(e) = run().await {
        error!("Startup failed: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Colored output for dev, JSON for production.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "gifbot=info,gifbot_api=info,gifbot_worker=info,gifbot_media=info,gifbot_storage=info",
        )
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> ApiResult<()> {
    info!("Starting gifbot-api");

    let config = ApiConfig::from_env();
    let discord_config = DiscordConfig::from_env()?;
    let conversion_config = Arc::new(ConversionConfig::from_env());
    info!(
        host = %config.host,
        port = config.port,
        max_gif_secs = conversion_config.max_gif_secs,
        max_concurrent = conversion_config.max_concurrent,
        work_dir = %conversion_config.work_dir.display(),
        "Loaded configuration"
    );

    let tools = ToolPaths::discover(conversion_config.tools_dir.as_deref())?;
    let uploader: Arc<dyn HostUploader> = Arc::new(LitterboxClient::from_env()?);
    let orchestrator =
        ConversionOrchestrator::with_tools(conversion_config.clone(), &tools, uploader)?;

    let state = AppState::new(config.clone(), &discord_config, orchestrator)?;

    if let Err(e) = state
        .discord
        .register_commands(conversion_config.max_gif_secs)
        .await
    {
        // Commands registered earlier keep working.
        warn!("Failed to register commands: {}", e);
    }

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ApiError::config(format!("Invalid bind address: {}", e)))?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
