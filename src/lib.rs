//! Pedef MCP - reader bridge over the Model Context Protocol
//!
//! A JSON-RPC-over-stdio server exposing the Pedef reader bridge as a
//! fixed set of MCP tools. Messages are framed with `Content-Length`
//! headers; tool invocations are serialized through a single-flight
//! execution queue.

pub mod bridge;
pub mod error;
pub mod mcp;
pub mod pipeline;
pub mod queue;

pub use bridge::{Bridge, BridgeData};
pub use error::{PedefError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
