use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prpilot::ai::GeminiReviewer;
use prpilot::config::Config;
use prpilot::{build_http_client, AppState};

#[derive(Parser, Debug)]
#[command(name = "prpilot")]
#[command(author, version, about = "GitHub App webhook receiver for pull request automation", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting prpilot v{}", env!("CARGO_PKG_VERSION"));
    config.warn_on_gaps();

    let http = build_http_client(&config.http).context("Failed to build HTTP client")?;
    let metrics_handle = prpilot::api::metrics::init_metrics()?;

    let reviewer = GeminiReviewer::from_config(http.clone(), &config.ai);
    match &reviewer {
        Some(_) => tracing::info!(model = %config.ai.model, "AI review enabled"),
        None => tracing::info!("No AI API key configured, AI review disabled"),
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let mut state = AppState::new(config, http).with_metrics(metrics_handle);
    if let Some(reviewer) = reviewer {
        state = state.with_reviewer(Arc::new(reviewer));
    }

    let app = prpilot::api::create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Webhook server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
