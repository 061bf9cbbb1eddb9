//! MCP JSON-RPC wire types and the stdio server loop

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use super::dispatch::RequestDispatcher;
use super::framing::{encode_message, FrameDecoder};
use crate::error::Result;
use crate::pipeline::PipelineResult;

/// MCP JSON-RPC response
///
/// `id` always serializes, as `null` when the request carried none;
/// `result` and `error` are mutually exclusive and the absent one is
/// omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError { code, message }),
        }
    }
}

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
}

/// MCP tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: "2025-11-25".to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "pedef-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolCallResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    /// Shape a finalized pipeline result into content blocks.
    ///
    /// A payload carrying inline image data becomes an image block plus
    /// a text block with the base64 bytes elided, so the metadata is not
    /// bloated by a second copy of the image. Everything else is a
    /// single pretty-printed text block.
    pub fn from_pipeline(result: &PipelineResult) -> Self {
        let image = result
            .payload
            .get("image_base64")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let mime = result
            .payload
            .get("mime_type")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        let mut value = serde_json::to_value(result).unwrap_or_else(|_| json!({}));

        if let (Some(data), Some(mime_type)) = (image, mime) {
            if let Some(payload) = value.get_mut("payload").and_then(|p| p.as_object_mut()) {
                payload.remove("image_base64");
            }
            let text = serde_json::to_string_pretty(&value).unwrap_or_default();
            return Self {
                content: vec![
                    ToolContent::Image { data, mime_type },
                    ToolContent::Text { text },
                ],
                is_error: None,
            };
        }

        Self::text(serde_json::to_string_pretty(&value).unwrap_or_default())
    }
}

/// MCP server speaking Content-Length framed JSON-RPC over stdio.
///
/// Messages are dispatched in decode order on the read loop, so tool
/// calls enter the execution queue in wire arrival order; only the wait
/// for each reply runs in its own task, so a queued `tools/call` never
/// blocks replies for other methods. Outbound frames are funneled
/// through a single writer task so they never interleave.
pub struct McpServer {
    dispatcher: RequestDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run until stdin closes. A stdin read error is the one condition
    /// that propagates out for a non-zero process exit.
    pub async fn run(&self) -> Result<()> {
        let mut stdin = tokio::io::stdin();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(frame) = out_rx.recv().await {
                if stdout.write_all(&frame).await.is_err() {
                    break;
                }
                let _ = stdout.flush().await;
            }
        });

        let mut decoder = FrameDecoder::new();
        let mut chunk = vec![0u8; 8192];
        loop {
            let read = stdin.read(&mut chunk).await?;
            if read == 0 {
                break; // EOF
            }
            for message in decoder.push(&chunk[..read]) {
                // Dispatch here, not in the spawned task: tool calls
                // must enter the queue in decode order.
                if let Some(reply) = self.dispatcher.dispatch(message) {
                    let out = out_tx.clone();
                    tokio::spawn(async move {
                        let response = reply.await;
                        match serde_json::to_value(&response) {
                            Ok(value) => {
                                let _ = out.send(encode_message(&value));
                            }
                            Err(e) => tracing::error!("Failed to serialize response: {}", e),
                        }
                    });
                }
            }
        }

        // In-flight tasks keep their sender clones; the writer drains
        // every remaining reply before exiting.
        drop(out_tx);
        let _ = writer.await;
        Ok(())
    }
}
