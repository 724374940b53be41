//! MCP server: exposes the Prem tools over newline-delimited JSON-RPC.
//!
//! ```text
//! MCP client
//!   │ stdin/stdout (newline-delimited JSON-RPC)
//!   ▼
//! McpServer
//!   ├── initialize, ping, tools/list
//!   └── tools/call ──spawn──▶ ToolHandler ──▶ PremApi
//! ```
//!
//! Each `tools/call` runs on its own task so slow remote calls do not hold up
//! other requests. Responses are funnelled through a channel to the single
//! writer and go out in completion order.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

use super::protocol::{
    error_codes, negotiate_protocol_version, IncomingMessage, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolCallParams,
    ToolsCapability, ToolsListResult,
};
use crate::{
    error::{PremError, Result},
    tools::{ToolContext, ToolRegistry},
};

/// Name reported to clients during `initialize`.
pub const SERVER_NAME: &str = "prem-ai-server";

/// The MCP server state.
#[derive(Clone)]
pub struct McpServer {
    tools: Arc<ToolRegistry>,
    context: Arc<ToolContext>,
}

impl McpServer {
    /// Create a server over a tool registry and shared tool context.
    pub fn new(tools: ToolRegistry, context: ToolContext) -> Self {
        Self {
            tools: Arc::new(tools),
            context: Arc::new(context),
        }
    }

    /// Shared tool context.
    #[must_use]
    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Serve on the process's stdin/stdout.
    ///
    /// # Errors
    ///
    /// Returns a transport error if stdin or stdout fails.
    pub async fn run_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests read from `reader`, writing responses to `writer`.
    ///
    /// Returns once the reader reaches EOF and every in-flight call has been
    /// answered.
    ///
    /// # Errors
    ///
    /// Returns a transport error if reading or writing fails.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Lines are framed as raw bytes so a line that is not UTF-8 gets a
        // parse error instead of ending the stream.
        let mut lines = FramedRead::new(reader, AnyDelimiterCodec::new(b"\n".to_vec(), b"\n".to_vec()));
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut tx = Some(tx);

        tracing::info!("MCP server running on stdio");

        loop {
            tokio::select! {
                line = lines.next(), if tx.is_some() => match line {
                    Some(Ok(line)) => {
                        if let Some(sender) = &tx {
                            self.dispatch_bytes(&line, sender);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("MCP server: stdin read error: {e}");
                        return Err(PremError::Transport(e.to_string()));
                    }
                    None => {
                        tracing::info!("MCP server: client disconnected (EOF)");
                        tx = None;
                    }
                },
                Some(response) = rx.recv() => {
                    write_response(&mut writer, &response).await?;
                }
                else => break,
            }
        }

        Ok(())
    }

    /// Decode one framed line and route it.
    fn dispatch_bytes(&self, line: &[u8], responses: &mpsc::UnboundedSender<JsonRpcResponse>) {
        match std::str::from_utf8(line) {
            Ok(line) => self.dispatch_line(line.trim(), responses),
            Err(e) => {
                tracing::warn!("MCP server: line is not valid UTF-8: {e}");
                let _ = responses.send(JsonRpcResponse::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        }
    }

    /// Route one incoming line; requests are answered through `responses`.
    fn dispatch_line(&self, line: &str, responses: &mpsc::UnboundedSender<JsonRpcResponse>) {
        if line.is_empty() {
            return;
        }

        match IncomingMessage::from_line(line) {
            Ok(IncomingMessage::Request(req)) => {
                let server = self.clone();
                let responses = responses.clone();
                tokio::spawn(async move {
                    let response = server.handle_request(&req).await;
                    if responses.send(response).is_err() {
                        tracing::warn!("MCP server: response dropped, writer closed");
                    }
                });
            }
            Ok(IncomingMessage::Notification(notif)) => self.handle_notification(&notif),
            Err(e) => {
                tracing::warn!("MCP server: failed to parse message: {e}");
                let response = if e.is_data() {
                    JsonRpcResponse::failure(request_id(line), error_codes::INVALID_REQUEST, format!("Invalid request: {e}"))
                } else {
                    JsonRpcResponse::failure(Value::Null, error_codes::PARSE_ERROR, format!("Parse error: {e}"))
                };
                let _ = responses.send(response);
            }
        }
    }

    /// Handle a JSON-RPC request and return a response.
    pub async fn handle_request(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req).await,
            "ping" => JsonRpcResponse::success(req.id.clone(), serde_json::json!({})),
            _ => JsonRpcResponse::failure(
                req.id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", req.method),
            ),
        }
    }

    /// Handle `initialize` request.
    fn handle_initialize(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let requested = req
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);

        let result = InitializeResult {
            protocol_version: negotiate_protocol_version(requested).to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(&req.id, &result)
    }

    /// Handle `tools/list` request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.tools.definitions(),
        };
        to_response(&req.id, &result)
    }

    /// Handle `tools/call` request.
    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match req.params.clone().map(serde_json::from_value::<ToolCallParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::failure(
                    req.id.clone(),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                );
            }
            None => {
                return JsonRpcResponse::failure(req.id.clone(), error_codes::INVALID_PARAMS, "Missing params");
            }
        };

        let Some(tool) = self.tools.get(&params.name) else {
            return JsonRpcResponse::failure(
                req.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        };

        tracing::debug!(tool = %params.name, "MCP server: tool call");
        match tool.invoke(params.arguments, &self.context).await {
            Ok(result) => to_response(&req.id, &result),
            Err(e) => JsonRpcResponse::failure(req.id.clone(), error_codes::INVALID_PARAMS, e.to_string()),
        }
    }

    /// Handle a notification (no response needed).
    fn handle_notification(&self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("MCP server: client completed initialization");
            }
            "notifications/cancelled" => {
                tracing::debug!("MCP server: client cancelled a request (calls run to completion)");
            }
            _ => {
                tracing::debug!("MCP server: unhandled notification: {}", notif.method);
            }
        }
    }
}

/// The `id` of a well-formed JSON message that is not a valid request, if any.
fn request_id(line: &str) -> Value {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|raw| raw.get("id").filter(|id| id.is_string() || id.is_number()).cloned())
        .unwrap_or(Value::Null)
}

/// Serialize a result into a success response.
fn to_response<T: serde::Serialize>(id: &Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id.clone(), value),
        Err(e) => JsonRpcResponse::failure(
            id.clone(),
            error_codes::INTERNAL_ERROR,
            format!("Failed to serialize result: {e}"),
        ),
    }
}

/// Write a JSON-RPC response as one line.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');

    writer
        .write_all(&json)
        .await
        .map_err(|e| PremError::Transport(e.to_string()))?;
    writer.flush().await.map_err(|e| PremError::Transport(e.to_string()))
}
