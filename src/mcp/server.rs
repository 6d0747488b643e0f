//! MCP Server implementation using JSON-RPC 2.0 over stdio
//!
//! Implements the minimal MCP protocol:
//! - `initialize` - Return server info and capabilities
//! - `tools/list` - Return available tool definitions
//! - `tools/call` - Execute a tool and return result
//!
//! Requests are handled one at a time in arrival order. Messages without an
//! `id` are notifications and never produce a response line.

use crate::config::ServerConfig;
use crate::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::tools::{ToolContext, ToolRegistry};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Server for handling JSON-RPC requests over stdio
pub struct McpServer {
    tool_registry: ToolRegistry,
    context: ToolContext,
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

// JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

type MethodResult = std::result::Result<Value, (i32, String)>;

impl McpServer {
    pub fn new(tool_registry: ToolRegistry, context: ToolContext) -> Self {
        Self {
            tool_registry,
            context,
        }
    }

    /// Build the registry and context from a loaded configuration
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let context = ToolContext::new(Arc::new(config), cwd);
        Ok(Self::new(ToolRegistry::new()?, context))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Run the MCP server, reading from stdin and writing to stdout
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited requests until the reader is exhausted
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            "{} {} started, waiting for requests...",
            self.context.config.server_name,
            self.context.config.server_version
        );

        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Read error: {}", e);
                    break;
                }
            };

            if let Some(response) = self.handle_line(&line) {
                let mut text = serde_json::to_string(&response)?;
                text.push('\n');
                writer.write_all(text.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Handle one input line; `None` means nothing should be written back
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        if line.trim().is_empty() {
            return None;
        }
        let response = self.handle_request(line)?;
        serde_json::to_value(response).ok()
    }

    fn handle_request(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Unparseable request: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        tracing::debug!("Received {}", request.method);

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(json!({ "tools": self.tool_registry.list_tools() })),
            "tools/call" => self.handle_tools_call(request.params.as_ref()),
            "ping" | "shutdown" => Ok(json!({})),
            method if method.starts_with("notifications/") || method == "initialized" => {
                Ok(json!({}))
            }
            _ => Err((
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        let id = request.id?;
        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        })
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.context.config.server_name,
                "version": self.context.config.server_version,
            },
            "capabilities": {
                "tools": {}
            }
        })
    }

    fn handle_tools_call(&self, params: Option<&Value>) -> MethodResult {
        let params = params.ok_or((INVALID_PARAMS, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        tracing::info!("Calling tool: {}", name);
        tracing::debug!("Arguments for {}: {}", name, arguments);

        match self.tool_registry.call_tool(name, &arguments, &self.context) {
            Ok(output) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": output.to_text()
                }]
            })),
            Err(e) => {
                tracing::warn!("Tool {} failed: {:#}", name, e);
                Ok(json!({
                    "content": [{
                        "type": "text",
                        "text": format!("Error: {:#}", e)
                    }],
                    "isError": true
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn server(temp: &TempDir) -> McpServer {
        let config = ServerConfig {
            server_name: "test-server".into(),
            project_dir: Some(temp.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let ctx = ToolContext::new(Arc::new(config), temp.path());
        McpServer::new(ToolRegistry::new().unwrap(), ctx)
    }

    #[test]
    fn test_from_config_uses_absolute_cwd() {
        let server = McpServer::from_config(ServerConfig::default()).unwrap();
        assert!(server.context().cwd.is_absolute());
        assert_eq!(server.context().cwd, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_parse_request() {
        let json = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let request: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.method, "initialize");
        assert_eq!(request.id, Some(json!(1)));
    }

    #[test]
    fn test_serialize_response() {
        let response = JsonRpcResponse::success(json!(1), json!({"status": "ok"}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_initialize_uses_configured_name() {
        let temp = TempDir::new().unwrap();
        let reply = server(&temp)
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .unwrap();
        assert_eq!(reply["result"]["serverInfo"]["name"], "test-server");
        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn test_notification_has_no_reply() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .is_none());
        assert!(server.handle_line("   ").is_none());
    }

    #[test]
    fn test_error_codes() {
        let temp = TempDir::new().unwrap();
        let server = server(&temp);

        let parse = server.handle_line("{not json").unwrap();
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert_eq!(parse["id"], Value::Null);

        let version = server
            .handle_line(r#"{"jsonrpc":"1.0","id":2,"method":"tools/list"}"#)
            .unwrap();
        assert_eq!(version["error"]["code"], INVALID_REQUEST);

        let unknown = server
            .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .unwrap();
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let params = server
            .handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#)
            .unwrap();
        assert_eq!(params["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn test_tool_error_sets_is_error() {
        let temp = TempDir::new().unwrap();
        let reply = server(&temp)
            .handle_line(
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"spec_init","arguments":{}}}"#,
            )
            .unwrap();
        assert_eq!(reply["result"]["isError"], true);
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("feature_name"));
    }
}
