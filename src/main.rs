//! Biascope - Heuristic Bias Diagnostics Service
//!
//! Entry point for the HTTP API server and database management commands.

use biascope_core::{
    ApiServer, ConnectionMode, LibsqlStorage, Result, Settings, StorageBackend,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

/// Default database path under the platform data directory
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("biascope")
        .join("biascope.db")
}

/// Resolve the database path from CLI arg, settings, or platform default
fn resolve_db_path(cli_path: Option<String>, settings: &Settings) -> String {
    cli_path.unwrap_or_else(|| {
        if settings.database_url == "biascope.db" {
            default_db_path().to_string_lossy().to_string()
        } else {
            settings.database_url.clone()
        }
    })
}

async fn open_storage(db_path: &str, create_if_missing: bool) -> Result<LibsqlStorage> {
    if let Some(parent) = PathBuf::from(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    LibsqlStorage::new_with_validation(ConnectionMode::Local(db_path.to_string()), create_if_missing)
        .await
}

#[derive(Parser)]
#[command(name = "biascope")]
#[command(about = "Heuristic bias diagnostics service for AI systems", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database path (overrides BIASCOPE_DATABASE_URL and the default)
    #[arg(long)]
    db_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides BIASCOPE_API_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides BIASCOPE_API_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Initialize the database and apply migrations
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "biascope={level},tower_http=info",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    debug!("Biascope v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load()?;

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                settings.api_host = host;
            }
            if let Some(port) = port {
                settings.api_port = port;
            }
            let db_path = resolve_db_path(cli.db_path, &settings);
            serve(settings, db_path).await
        }
        Some(Commands::Init) => {
            let db_path = resolve_db_path(cli.db_path, &settings);
            debug!("Initializing database at {}", db_path);

            let _storage = open_storage(&db_path, true).await?;
            println!("Database initialized: {}", db_path);
            Ok(())
        }
        None => {
            let db_path = resolve_db_path(cli.db_path, &settings);
            serve(settings, db_path).await
        }
    }
}

async fn serve(settings: Settings, db_path: String) -> Result<()> {
    debug!("Using database: {}", db_path);
    let storage = open_storage(&db_path, true).await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(storage);

    let server = ApiServer::new(storage, settings);

    tokio::select! {
        result = server.serve() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping API server");
        }
    }

    Ok(())
}
