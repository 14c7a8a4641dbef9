//! replay-proxy server binary.
//!
//! Usage:
//!   replay-proxy [--config replay.yaml] [--port 3000] [OPTIONS]

use anyhow::Context;
use clap::Parser;
use replay_proxy::config::Config;
use replay_proxy::proxy::ProxyServer;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Record/replay HTTP proxy
#[derive(Parser, Debug)]
#[command(name = "replay-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long, env = "REPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Directory the log and mock directories are resolved against
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// JSON document mapping request paths to keyword field names
    #[arg(long)]
    keyword_map: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    validate: bool,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(root) = &self.storage_root {
            config.storage.root = root.clone();
        }
        if let Some(map) = &self.keyword_map {
            config.recording.keyword_map = Some(map.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = args.load_config()?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }
    if args.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    info!(
        "Starting replay-proxy v{} (logs={}, mocks={})",
        env!("CARGO_PKG_VERSION"),
        config.storage.logs_path().display(),
        config.storage.mocks_path().display()
    );

    let server = ProxyServer::new(&config)?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
