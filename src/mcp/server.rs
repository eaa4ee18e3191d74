//! MCP Server implementation
//!
//! Line-delimited JSON-RPC over stdio. Requests are handled one at a time;
//! logs go to stderr so stdout carries protocol messages only.

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{McpError, Result};
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

/// MCP Server info
pub const SERVER_NAME: &str = "productive";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Use these tools to access Productive projects, tasks, comments, \
docs pages, attachments, todo items and recent activity. Focus on providing accurate and concise \
information based on the data available in Productive. If a project name or ID is provided, \
focus on that project. If a task ID is provided, focus on that task. Task numbers shown in the \
web app are resolved with get_project_task.";

/// MCP Server for Productive
pub struct McpServer {
    tool_handler: ToolHandler,

    /// Whether the client sent `notifications/initialized`
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self {
            tool_handler,
            initialized: false,
        }
    }

    /// Run the server on stdio until stdin closes
    pub async fn run_stdio(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!(server = SERVER_NAME, version = SERVER_VERSION, "MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let mut response_str = serde_json::to_string(&response)?;
                    response_str.push('\n');
                    stdout.write_all(response_str.as_bytes()).await?;
                    stdout.flush().await?;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Error handling message");
                }
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one incoming JSON-RPC message. Notifications yield `None`.
    pub async fn handle_message(&mut self, message: &str) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable message");
                return Ok(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request.method);
            return Ok(None);
        };
        tracing::debug!(method = %request.method, "request");

        let response = match request.method.as_str() {
            methods::INITIALIZE => JsonRpcResponse::success(Some(id), self.handle_initialize()?),
            methods::PING => JsonRpcResponse::success(Some(id), json!({})),
            methods::LIST_TOOLS => JsonRpcResponse::success(Some(id), self.handle_list_tools()?),
            methods::CALL_TOOL => match self.handle_call_tool(request.params).await {
                Ok(result) => JsonRpcResponse::success(Some(id), result),
                Err(e) => JsonRpcResponse::error(Some(id), JsonRpcError::invalid_params(e.to_string())),
            },
            other => JsonRpcResponse::error(Some(id), JsonRpcError::method_not_found(other)),
        };

        Ok(Some(response))
    }

    /// Whether the initialize handshake has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn handle_notification(&mut self, method: &str) {
        if method == methods::INITIALIZED {
            self.initialized = true;
            tracing::info!("client initialized");
        } else {
            tracing::debug!(method, "ignoring notification");
        }
    }

    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {}),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        to_value(result)
    }

    fn handle_list_tools(&self) -> Result<Value> {
        to_value(ListToolsResult {
            tools: self.tool_handler.list_tools(),
        })
    }

    /// Malformed call params are a protocol error; tool failures are
    /// reported inside the result with `isError`.
    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| McpError::InvalidParams {
            message: "missing tool call parameters".to_string(),
        })?;
        let params: CallToolParams =
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams {
                message: e.to_string(),
            })?;

        tracing::info!(tool = %params.name, "tool call");
        let result = self
            .tool_handler
            .call_tool(&params.name, params.arguments)
            .await;
        to_value(result)
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_info() {
        assert_eq!(SERVER_NAME, "productive");
        assert!(INSTRUCTIONS.contains("get_project_task"));
    }
}
