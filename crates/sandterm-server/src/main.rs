//! Sandterm server - browser consoles for remote sandboxes.

use anyhow::Result;
use clap::Parser;
use sandterm_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogFormat, LogSettings, Verbosity};
use state::AppState;

/// Sandterm server - browser consoles for remote sandboxes.
#[derive(Parser, Debug)]
#[command(name = "sandterm-server")]
#[command(about = "HTTP/WebSocket server for sandbox terminal consoles")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (DEBUG level, excludes ping traces)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything, including raw PTY output)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "console=debug" or "ws::ping=trace")
    /// Can be specified multiple times. Targets are prefixed with "sandterm::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose, cli.debug, cli.trace);
    let log_settings = LogSettings::new(verbosity, cli.log_format).with_overrides(&cli.log_overrides);
    logging::init(&log_settings);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(
        target: "sandterm::startup",
        "Loaded configuration (port: {}, shell: {}, max sessions: {})",
        config.port,
        config.shell,
        config.max_sessions
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config));
    let app = routes::router(state);

    tracing::info!(target: "sandterm::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
