//! SearchGate - quota-gated search relay
//!
//! Serves the search API in front of a third-party search provider.

use anyhow::Result;
use clap::{Parser, Subcommand};
use searchgate::{
    api::build_app,
    config::RelayConfig,
    gate::QueryGate,
    upstream::{SearchProvider, TavilyClient},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "searchgate")]
#[command(version)]
#[command(about = "Quota-gated search relay")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SEARCHGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },

    /// Validate configuration and report upstream credentials
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let mut config = match &cli.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::default(),
    };
    config.apply_env_overrides();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Config { default } => {
            let shown = if default {
                RelayConfig::default()
            } else {
                config
            };
            println!("{}", shown.to_toml()?);
        }
        Commands::Check => {
            run_check(&config)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("searchgate={},tower_http={}", log_level, log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_provider(config: &RelayConfig) -> Result<Option<Arc<dyn SearchProvider>>> {
    match config.upstream.resolve_api_key() {
        Some(key) => {
            let client = TavilyClient::new(&config.upstream, key)?;
            tracing::info!(endpoint = client.endpoint(), "Upstream search provider configured");
            let provider: Arc<dyn SearchProvider> = Arc::new(client);
            Ok(Some(provider))
        }
        None => {
            tracing::warn!(
                env = %config.upstream.api_key_env,
                "No search API key found; answering every search with a mock response"
            );
            Ok(None)
        }
    }
}

async fn run_server(config: RelayConfig) -> Result<()> {
    config.validate()?;

    let provider = build_provider(&config)?;
    let gate = Arc::new(QueryGate::new(&config, provider));
    let app = build_app(gate, &config.server);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let addr = listener.local_addr()?;

    tracing::info!(
        %addr,
        ai_per_day = config.quota.ai_per_day,
        web_per_day = config.quota.web_per_day,
        "SearchGate listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("SearchGate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}

fn run_check(config: &RelayConfig) -> Result<()> {
    println!("SearchGate configuration check");
    println!();

    match config.validate() {
        Ok(()) => println!("  ✓ Configuration is valid"),
        Err(e) => {
            println!("  ✗ {}", e);
            return Err(e.into());
        }
    }

    if config.upstream.resolve_api_key().is_some() {
        println!(
            "  ✓ Search API key found in ${}",
            config.upstream.api_key_env
        );
    } else {
        println!(
            "  ℹ ${} is not set; searches will return mock answers",
            config.upstream.api_key_env
        );
    }

    println!(
        "  ℹ Quotas: {} AI / {} web per origin every {}s",
        config.quota.ai_per_day, config.quota.web_per_day, config.quota.window_secs
    );

    Ok(())
}
