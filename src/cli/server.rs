//! start CLI subcommand
//!
//! Runs the MCP server over stdio until stdin closes.

use crate::config::ServerConfig;
use crate::mcp::McpServer;
use crate::Result;

/// Run the MCP server with an already-loaded configuration
pub async fn run(config: ServerConfig) -> Result<()> {
    config.validate()?;
    tracing::info!(
        "Starting {} {} (control dir: {}, strict phase gates: {})",
        config.server_name,
        config.server_version,
        config.kiro_dir,
        config.strict_phase_gates
    );
    let server = McpServer::from_config(config)?;
    server.run().await
}
