use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use directive_gateway::config::{Config, DEFAULT_CONFIG_PATH, ENV_API_KEY};
use directive_gateway::server::{AppState, build_app};
use directive_gateway::upstream::{HttpTransport, build_client};

#[derive(Parser)]
#[command(name = "directive-gateway", version, about)]
struct Cli {
    /// Path to the YAML config file. A missing file means defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Listen host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides config and GATEWAY_PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let base_url = config.upstream.base_url()?;
    let client = build_client(&config.upstream)?;
    let transport = HttpTransport::new(client, base_url);

    let directive = config.directive();
    info!(
        base_url = %config.upstream.base_url,
        default_model = %config.upstream.default_model,
        directive = %directive.preview(50),
        "Gateway configured"
    );
    if config.upstream.api_key().is_none() {
        warn!("{ENV_API_KEY} is not set; completion requests will fail until it is configured");
    }

    let state = AppState::new(&config, Arc::new(transport));
    let app = build_app(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "LLM Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("LLM Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
