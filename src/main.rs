//! RAX File Manager - Entry Point
//!
//! Serves a single directory tree over HTTP: anyone can browse and download,
//! logged-in users can upload and remove.

use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use rax_file_manager::config::ServerConfig;
use rax_file_manager::utils::logging::setup_logging;
use rax_file_manager::{AppState, Server};

#[derive(Parser, Debug)]
#[command(name = "rax-file-manager", version, about = "Browser-accessible file manager")]
struct Args {
    /// Directory to serve (overrides `server_root` from the config file)
    root: Option<String>,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long, env = "RAX_FM_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let args = Args::parse();

    info!("Launching file manager...");

    let config = match ServerConfig::load(args.config.as_deref(), args.root) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Server root: {} ({} user(s))",
        state.root().path().display(),
        state.credentials().len()
    );

    let server = match Server::bind(&config.http_socket(), state).await {
        Ok(server) => server,
        Err(e) => {
            error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.start().await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
