//! Scadpad MCP Server - Model Context Protocol server for the OpenSCAD
//! scratchpad
//!
//! This crate exposes a persistent single-script scratchpad to AI agents.
//! Agents can:
//!
//! - Create or replace the current OpenSCAD script
//! - Render preview images from fixed camera views
//! - Export the script as an STL mesh for fabrication
//! - Save the script itself to a .scad file
//!
//! ## Workflow
//!
//! 1. `create_script` - Put an OpenSCAD script in the scratchpad
//! 2. `render` - See what the model looks like from a chosen view
//! 3. Iterate on the script based on visual feedback
//! 4. `export` - Produce the final STL for printing
//!
//! The scratchpad survives server restarts; the script is persisted under
//! the working directory on every update.

pub mod state;
pub mod tools;

use rmcp::{
    ErrorData as McpError,
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use scadpad_core::render::PNG_MIME;

use crate::state::ScadpadState;
use crate::tools::{
    export::{ExportRequest, SaveScriptRequest},
    render::RenderRequest,
    script::CreateScriptRequest,
};

const EMPTY_SCRATCHPAD: &str =
    "The scratchpad is empty. Use create_script to add an OpenSCAD script first.";

/// The scadpad MCP service
///
/// Implements the MCP ServerHandler to expose the scratchpad operations as
/// tools. All state lives behind the cloneable [`ScadpadState`] handle.
#[derive(Clone)]
pub struct ScadpadMcpService {
    state: ScadpadState,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ScadpadMcpService {
    /// Create a new MCP service with the given state
    pub fn new(state: ScadpadState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Show the current OpenSCAD script in the scratchpad.")]
    async fn show_script(&self) -> Result<CallToolResult, McpError> {
        let script = self.state.show_script();
        if script.trim().is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                EMPTY_SCRATCHPAD,
            )]));
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Current OpenSCAD script:\n\n{script}"
        ))]))
    }

    #[tool(description = "Create or replace the OpenSCAD script in the scratchpad. The script is persisted and used by subsequent render, export, and save calls.")]
    async fn create_script(
        &self,
        params: Parameters<CreateScriptRequest>,
    ) -> Result<CallToolResult, McpError> {
        let content = params.0.content;
        match self.state.update_script(&content) {
            Ok(record) => {
                let lines = content.lines().count();
                let chars = content.chars().count();
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Script updated ({lines} lines, {chars} characters) at {}",
                    record.updated_at.to_rfc3339()
                ))]))
            }
            Err(e) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Error updating script: {e}"
            ))])),
        }
    }

    #[tool(description = "Render the current scratchpad script as a PNG preview image. Views: front, back, left, right, top, bottom, isometric (default).")]
    async fn render(
        &self,
        params: Parameters<RenderRequest>,
    ) -> Result<CallToolResult, McpError> {
        if self.state.script().trim().is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                EMPTY_SCRATCHPAD,
            )]));
        }

        match self.state.render(&params.0.view).await {
            Ok(image) => Ok(CallToolResult::success(vec![Content::image(
                image.png_base64,
                PNG_MIME,
            )])),
            Err(e) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Render error: {e}"
            ))])),
        }
    }

    #[tool(description = "Export the current scratchpad script as an STL file in the working directory. The .stl extension is appended if absent. Returns the file path and size.")]
    async fn export(
        &self,
        params: Parameters<ExportRequest>,
    ) -> Result<CallToolResult, McpError> {
        if self.state.script().trim().is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                EMPTY_SCRATCHPAD,
            )]));
        }

        match self.state.export(&params.0.filename).await {
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Exported {} ({} bytes)",
                result.path.display(),
                result.byte_size
            ))])),
            Err(e) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Export error: {e}"
            ))])),
        }
    }

    #[tool(description = "Save the current scratchpad script to a .scad file in the working directory.")]
    async fn save_script(
        &self,
        params: Parameters<SaveScriptRequest>,
    ) -> Result<CallToolResult, McpError> {
        if self.state.script().trim().is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                EMPTY_SCRATCHPAD,
            )]));
        }

        match self.state.save_script(&params.0.filename) {
            Ok(path) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Script saved to {}",
                path.display()
            ))])),
            Err(e) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Save error: {e}"
            ))])),
        }
    }
}

#[tool_handler]
impl ServerHandler for ScadpadMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "scadpad-mcp".to_string(),
                title: Some("OpenSCAD Scratchpad".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: Some("https://github.com/scadpad/scadpad".to_string()),
            },
            instructions: Some(
                "Scadpad MCP server: a persistent scratchpad holding one OpenSCAD script. \
                 \n\nWorkflow:\n\
                 1. create_script(content) - Put an OpenSCAD script in the scratchpad\n\
                 2. render(view) - Preview the model (front, back, left, right, top, bottom, isometric)\n\
                 3. Iterate on the script based on visual feedback\n\
                 4. export(filename) - Produce an STL mesh for fabrication\n\n\
                 The scratchpad survives restarts; use show_script to recall the current script."
                    .to_string(),
            ),
        }
    }
}
