//! JSON-RPC method dispatch
//!
//! Routes each decoded message to its handler and produces at most one
//! response. Protocol errors (-32600, -32601) and tool failures are kept
//! on separate channels: a tool failure is a *successful* JSON-RPC result
//! carrying `isError: true`, never a protocol error.

use std::future::Future;
use std::pin::Pin;

use serde_json::{json, Value};

use super::protocol::{methods, InitializeResult, McpResponse, ToolCallResult};
use super::tools::{find_tool, tool_definitions};
use crate::error::PedefError;
use crate::pipeline::ToolKind;
use crate::queue::{ToolCall, ToolQueue};

/// Pending reply for one request; resolves off the read loop
pub type ReplyFuture = Pin<Box<dyn Future<Output = McpResponse> + Send>>;

/// The per-session request dispatcher
pub struct RequestDispatcher {
    queue: ToolQueue,
}

impl RequestDispatcher {
    pub fn new(queue: ToolQueue) -> Self {
        Self { queue }
    }

    /// Classify one decoded message. Returns `None` for notifications
    /// and for envelopes that cannot carry a reply; otherwise returns
    /// the future for the single reply.
    ///
    /// Tool calls enter the execution queue before this method returns,
    /// so callers that dispatch messages in arrival order get
    /// arrival-order queue execution no matter when the reply futures
    /// are awaited.
    pub fn dispatch(&self, message: Value) -> Option<ReplyFuture> {
        let envelope = message.as_object()?;

        // A JSON `null` id counts as absent: notifications get no reply.
        let id = envelope.get("id").filter(|v| !v.is_null()).cloned();

        let Some(method) = envelope.get("method").and_then(|v| v.as_str()) else {
            tracing::debug!("Envelope without string method");
            return id.map(|id| {
                immediate(McpResponse::error(
                    Some(id),
                    -32600,
                    "Invalid Request: missing or non-string method".to_string(),
                ))
            });
        };

        match method {
            methods::INITIALIZE => Some(immediate(McpResponse::success(
                id,
                json!(InitializeResult::default()),
            ))),
            methods::INITIALIZED => None,
            methods::LIST_TOOLS => Some(immediate(McpResponse::success(
                id,
                json!({"tools": tool_definitions()}),
            ))),
            methods::CALL_TOOL => Some(self.call_tool(id, envelope.get("params"))),
            other => {
                tracing::debug!("Method not found: {}", other);
                id.map(|id| {
                    immediate(McpResponse::error(
                        Some(id),
                        -32601,
                        format!("Method not found: {}", other),
                    ))
                })
            }
        }
    }

    /// Handle one decoded message to completion
    pub async fn handle(&self, message: Value) -> Option<McpResponse> {
        match self.dispatch(message) {
            Some(reply) => Some(reply.await),
            None => None,
        }
    }

    fn call_tool(&self, id: Option<Value>, params: Option<&Value>) -> ReplyFuture {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str());

        let known = name.filter(|n| find_tool(n).is_some());
        let Some(tool) = known.and_then(ToolKind::from_name) else {
            let shown = name.unwrap_or("<missing>");
            let failure = PedefError::UnknownTool(shown.to_string());
            return immediate(McpResponse::success(
                id,
                json!(ToolCallResult::error(failure.to_string())),
            ));
        };

        let arguments = params
            .and_then(|p| p.get("arguments"))
            .cloned()
            .unwrap_or_else(|| json!({}));

        // Enqueue now; only the wait for completion is deferred.
        let completion = self.queue.submit(ToolCall { tool, arguments });
        Box::pin(async move {
            match completion.await {
                Ok(result) => {
                    McpResponse::success(id, json!(ToolCallResult::from_pipeline(&result)))
                }
                Err(e) => McpResponse::success(id, json!(ToolCallResult::error(e.to_string()))),
            }
        })
    }
}

fn immediate(response: McpResponse) -> ReplyFuture {
    Box::pin(async move { response })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Bridge, BridgeData};
    use crate::pipeline::Pipeline;
    use pretty_assertions::assert_eq;

    fn dispatcher() -> RequestDispatcher {
        let pipeline = Pipeline::new(Bridge::new(BridgeData::demo()));
        RequestDispatcher::new(ToolQueue::start(pipeline))
    }

    #[tokio::test]
    async fn initialize_returns_server_info() {
        let response = dispatcher()
            .handle(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .await
            .unwrap();
        assert_eq!(response.id, Some(json!(1)));
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "pedef-mcp");
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn initialized_notification_gets_no_reply() {
        let response = dispatcher()
            .handle(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn null_id_counts_as_notification() {
        let response = dispatcher()
            .handle(json!({"jsonrpc": "2.0", "id": null, "method": "nonexistent/method"}))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn missing_method_with_id_is_invalid_request() {
        let response = dispatcher()
            .handle(json!({"jsonrpc": "2.0", "id": 4}))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32600);
        assert_eq!(response.id, Some(json!(4)));
    }

    #[tokio::test]
    async fn missing_method_without_id_gets_no_reply() {
        let response = dispatcher().handle(json!({"jsonrpc": "2.0"})).await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn non_object_envelope_gets_no_reply() {
        let dispatcher = dispatcher();
        assert!(dispatcher.handle(json!("hello")).await.is_none());
        assert!(dispatcher.handle(json!(42)).await.is_none());
        assert!(dispatcher.handle(json!([1, 2])).await.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_a_protocol_error() {
        let response = dispatcher()
            .handle(json!({"jsonrpc": "2.0", "id": 9, "method": "nonexistent/method"}))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found: nonexistent/method");
    }

    #[tokio::test]
    async fn list_tools_returns_registry() {
        let response = dispatcher()
            .handle(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0]["name"], "reader.list_entrypoints");
        assert_eq!(tools[4]["name"], "reader.snapshot_state");
    }

    #[tokio::test]
    async fn unknown_tool_is_a_tool_error_not_a_protocol_error() {
        let response = dispatcher()
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "nonexistent.tool"}
            }))
            .await
            .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Unknown tool: nonexistent.tool");
    }

    #[tokio::test]
    async fn missing_tool_name_is_reported() {
        let response = dispatcher()
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": {}
            }))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "Unknown tool: <missing>");
    }

    #[tokio::test]
    async fn tool_call_returns_encoded_result() {
        let response = dispatcher()
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {
                    "name": "reader.get_text",
                    "arguments": {"session_id": "demo-session", "page_index": 0}
                }
            }))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("demo page text"));
    }

    #[tokio::test]
    async fn pipeline_failure_becomes_tool_error() {
        let response = dispatcher()
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": {
                    "name": "reader.snapshot_state",
                    "arguments": {"session_id": "nope"}
                }
            }))
            .await
            .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Unknown session_id: nope");
    }

    #[tokio::test]
    async fn tool_calls_enter_queue_in_dispatch_order() {
        let dispatcher = dispatcher();
        let request = |id: i64, page: i64| {
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": {
                    "name": "reader.get_text",
                    "arguments": {"session_id": "demo-session", "page_index": page}
                }
            })
        };

        let first = dispatcher.dispatch(request(1, 0)).unwrap();
        let second = dispatcher.dispatch(request(2, 1)).unwrap();

        // Await the replies in reverse order; the calls must still have
        // run in dispatch order.
        let second = second.await;
        let first = first.await;

        let produced_at = |response: &McpResponse| {
            let result = response.result.as_ref().unwrap();
            let text = result["content"][0]["text"].as_str().unwrap();
            let parsed: Value = serde_json::from_str(text).unwrap();
            parsed["produced_at"].as_str().unwrap().to_string()
        };
        assert!(produced_at(&first) <= produced_at(&second));
        assert_eq!(first.id, Some(json!(1)));
        assert_eq!(second.id, Some(json!(2)));
    }

    #[tokio::test]
    async fn missing_arguments_default_to_empty_object() {
        let response = dispatcher()
            .handle(json!({
                "jsonrpc": "2.0",
                "id": 10,
                "method": "tools/call",
                "params": {"name": "reader.list_entrypoints"}
            }))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert!(result.get("isError").is_none());
    }
}
