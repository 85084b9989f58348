//! MCP server binding for the tool adapter.
//!
//! Serves the three tool operations to an agent host over stdio. Protocol
//! problems (unknown tool, malformed arguments) are MCP errors; domain
//! failures are ordinary tool results flagged as errors so the host can
//! explain them to the user.

use rmcp::{
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
    transport::stdio,
    ErrorData as McpError, ServiceExt,
};
use tracing::{debug, info};

use crate::error::{Result, TlcError};
use crate::prompt;
use crate::tools::{ToolAdapter, ToolCall, ToolReply};

/// MCP handler wrapping a [`ToolAdapter`].
#[derive(Clone)]
pub struct TlcMcpServer {
    adapter: ToolAdapter,
    instructions: String,
}

impl TlcMcpServer {
    pub fn new(adapter: ToolAdapter) -> Self {
        let instructions = prompt::build_instructions(adapter.catalog(), adapter.max_rows());
        Self {
            adapter,
            instructions,
        }
    }

    /// MCP tool list built from the adapter's definitions.
    pub fn tools(&self) -> Vec<Tool> {
        self.adapter
            .definitions()
            .into_iter()
            .map(|def| Tool::new(def.name, def.description, object(def.parameters)))
            .collect()
    }

    /// Parses and runs one tool call.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let call = ToolCall::parse(name, arguments)
            .map_err(|e| McpError::invalid_params(e.message(), None))?;
        debug!("Tool call: {:?}", call);

        let ToolReply { text, is_error } = self.adapter.call(call).await;
        let content = vec![Content::text(text)];
        Ok(if is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        })
    }

    /// Serves MCP over stdin/stdout until the host disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        info!("Serving {} tools over stdio", self.adapter.definitions().len());
        let running = self
            .serve(stdio())
            .await
            .map_err(|e| TlcError::internal(format!("MCP initialization failed: {e}")))?;

        let reason = running
            .waiting()
            .await
            .map_err(|e| TlcError::internal(format!("MCP server task failed: {e}")))?;
        info!("MCP session ended: {:?}", reason);
        Ok(())
    }
}

impl ServerHandler for TlcMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(self.instructions.clone()),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<CallToolResult, McpError>> + Send + '_
    {
        async move { self.dispatch(request.name.as_ref(), request.arguments).await }
    }
}
