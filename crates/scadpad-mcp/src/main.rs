//! Scadpad MCP Server Binary
//!
//! Runs the scratchpad MCP server on stdio transport, allowing AI agents
//! to iterate on OpenSCAD models: update the script, render previews, and
//! export meshes.
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! scadpad-mcp
//! ```
//!
//! Or add to Claude Desktop's MCP configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "scadpad": {
//!       "command": "scadpad-mcp",
//!       "env": { "SCADPAD_WORK_DIR": "/path/to/models" }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use scadpad_core::Config;
use scadpad_mcp::ScadpadMcpService;
use scadpad_mcp::state::ScadpadState;

#[tokio::main]
async fn main() -> Result<()> {
    // CRITICAL: Log to stderr only - stdout is reserved for MCP JSON-RPC
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let config = Config::from_env();

    eprintln!("Scadpad MCP server v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Working directory: {}", config.work_dir.display());

    let state = ScadpadState::new(&config)?;
    eprintln!("Session state: {}", state.state_path().display());

    // Probe once up front; a missing engine is reported, not fatal, so the
    // scratchpad tools keep working.
    match state.probe_engine().await {
        Ok(version) => tracing::info!(%version, "OpenSCAD is available"),
        Err(e) => tracing::warn!(error = %e, "OpenSCAD unavailable; render and export will fail"),
    }

    eprintln!("Ready. Listening on stdio...");

    let service = ScadpadMcpService::new(state);
    let server = service.serve(stdio()).await?;

    // Wait for client to disconnect or error
    server.waiting().await?;

    eprintln!("Client disconnected. Shutting down.");
    Ok(())
}
