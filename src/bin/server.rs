//! memdocdb Server Binary
//!
//! Loads configuration, syncs from peers, then runs the TCP event loop
//! until the process is terminated.

use std::path::PathBuf;

use clap::Parser;
use memdocdb::network::{detect_local_ip, Server};
use memdocdb::replication::ReplicationManager;
use memdocdb::{Config, Engine, ReplicaConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// memdocdb Server
#[derive(Parser, Debug)]
#[command(name = "memdocdb-server")]
#[command(about = "In-memory JSON document database with peer replication")]
#[command(version)]
struct Args {
    /// Config file (default: memdocdb.json in the server root, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server root directory
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Listen IP
    #[arg(long)]
    ip: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Replica as host:port (repeatable, replaces the configured list)
    #[arg(long = "replica")]
    replicas: Vec<ReplicaConfig>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,memdocdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("memdocdb Server v{}", memdocdb::VERSION);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server root: {}", config.server_root.display());
    tracing::info!("Listen address: {}", config.listen_addr());
    tracing::info!("Replicas configured: {}", config.replicas.len());

    // Sync from peers before accepting clients
    let replication = ReplicationManager::new(&config, detect_local_ip);
    let mut engine = Engine::new(replication);
    let merged = engine.bootstrap();
    if merged > 0 {
        tracing::info!("Bootstrapped {} documents from replicas", merged);
    }

    let mut server = match Server::bind(&config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    server.run();

    tracing::info!("Server stopped");
}

/// File config (explicit, or the default file when present) + CLI overrides
fn load_config(args: &Args) -> memdocdb::Result<Config> {
    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let default_file = root.join(memdocdb::config::DEFAULT_CONFIG_FILE);

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None if default_file.exists() => Config::from_file(&default_file)?,
        None => Config::default(),
    };

    if let Some(root) = &args.root {
        config.server_root = root.clone();
    }
    if let Some(ip) = &args.ip {
        config.ip = ip.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if !args.replicas.is_empty() {
        config.replicas = args.replicas.clone();
    }

    config.validate()?;
    Ok(config)
}
