//! MCP (Model Context Protocol) server implementation
//!
//! Content-Length framed JSON-RPC over stdio.

pub mod dispatch;
pub mod framing;
pub mod protocol;
pub mod tools;

pub use dispatch::RequestDispatcher;
pub use framing::{encode_message, FrameDecoder};
pub use protocol::{
    methods, InitializeResult, McpError, McpResponse, McpServer, ToolCallResult, ToolContent,
    ToolDefinition,
};
pub use tools::{find_tool, tool_definitions, TOOL_DEFINITIONS};
