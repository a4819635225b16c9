//! # pac-daemon
//!
//! Policy-as-code MCP server daemon.
//!
//! Starts an MCP server on stdio that an AI agent (or any MCP client)
//! connects to. Tool calls drive the policy-as-code automation module and
//! the cloud CLI through the gateway.
//!
//! ## Usage
//!
//! Typically started automatically by the MCP client via `.mcp.json`:
//! ```json
//! {
//!   "mcpServers": {
//!     "pac": {
//!       "type": "stdio",
//!       "command": "pac-daemon",
//!       "args": ["--config", "/policies/config.json"]
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pac_gateway::config::CONFIG_FILENAME;
use pac_gateway::{PacConfig, PacGatewayServer};

/// Policy-as-code MCP server.
#[derive(Parser)]
#[command(name = "pac-daemon", about = "Policy-as-code MCP server")]
struct Cli {
    /// Path to the config file (defaults to config.json in the current directory).
    #[arg(long, default_value = CONFIG_FILENAME)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interfere with MCP on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pac_gateway=info".parse()?)
                .add_directive("pac_exec=info".parse()?)
                .add_directive("pac_daemon=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = PacConfig::load(&cli.config)?;

    tracing::info!("Starting policy-as-code MCP server");
    tracing::info!(
        definitions_root = %config.definitions_root.display(),
        pac_selector = %config.pac_selector,
        output_folder = %config.output_folder.display(),
        "Configuration loaded"
    );
    for violation in config.validate() {
        // Not fatal here: tools report the full list per call, and the
        // environment may be fixed while the server is running.
        tracing::warn!("configuration issue: {}", violation);
    }

    let server = PacGatewayServer::new(config);

    tracing::info!("MCP server ready, waiting for client connection");

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {:?}", e))?;

    service.waiting().await?;

    tracing::info!("MCP server shutting down");
    Ok(())
}
