//! MCP server for a personal productivity workspace.
//!
//! Run with `workbench-mcp --db /path/to/app.db`. Every option can also be
//! set through its environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use workbench_mcp::config::{
    Config, DEFAULT_DB_PATH, DEFAULT_LOG_LEVEL, DEFAULT_MAX_FILE_SIZE, DEFAULT_QUERY_TIMEOUT_SECS,
    DEFAULT_SERVER_NAME, MAX_QUERY_TIMEOUT_SECS,
};
use workbench_mcp::{Dispatcher, McpServer, Session};

/// MCP server for notes and local files.
///
/// Exposes a SQLite note store and the filesystem as MCP tools, resources
/// and prompts. Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "workbench-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite note store. Created if missing.
    #[arg(long, value_name = "PATH", env = "DB_PATH", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Store timeout in seconds. 0 disables the statement deadline.
    #[arg(
        long,
        value_name = "SECS",
        env = "QUERY_TIMEOUT",
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(0..=MAX_QUERY_TIMEOUT_SECS)
    )]
    query_timeout: u64,

    /// Largest file, in bytes, that read_file will load.
    #[arg(long, value_name = "BYTES", env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, value_name = "LEVEL", env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Server name reported to clients.
    #[arg(long, value_name = "NAME", env = "SERVER_NAME", default_value = DEFAULT_SERVER_NAME)]
    server_name: String,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            server_name: self.server_name.clone(),
            log_level: self.log_level.clone(),
            ..Config::new(&self.db)
        }
        .with_query_timeout(Duration::from_secs(self.query_timeout))
        .with_max_file_size(self.max_file_size)
    }
}

fn main() {
    let args = Args::parse();
    let config = args.config();

    // Logs go to stderr; stdout carries the protocol.
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(
        name = %config.server_name,
        version = %config.server_version,
        db = %config.db_path.display(),
        "starting server"
    );

    // Open the note store
    let session = match Session::open(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: Failed to open note store at '{}': {}", args.db.display(), e);
            std::process::exit(1);
        }
    };

    let dispatcher = match Dispatcher::new(session) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            eprintln!("Error: Failed to register operations: {}", e);
            std::process::exit(1);
        }
    };

    let mut server = McpServer::new(dispatcher);

    // Run the server
    if let Err(e) = server.run_sync() {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
