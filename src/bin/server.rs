//! Pedef MCP Server
//!
//! Run with: pedef-mcp-server

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pedef_mcp::bridge::{Bridge, BridgeData};
use pedef_mcp::error::Result;
use pedef_mcp::mcp::{McpServer, RequestDispatcher};
use pedef_mcp::pipeline::Pipeline;
use pedef_mcp::queue::ToolQueue;

#[derive(Parser, Debug)]
#[command(name = "pedef-mcp-server")]
#[command(about = "MCP server exposing the Pedef reader bridge over stdio")]
struct Args {
    /// Bridge dataset file (JSON); falls back to the built-in demo
    /// dataset when unset or unreadable
    #[arg(long, env = "PEDEF_MCP_BRIDGE_FILE")]
    bridge_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // The dataset is loaded once per process.
    let data = match args.bridge_file {
        Some(path) => BridgeData::from_file(&path).unwrap_or_else(|e| {
            tracing::warn!("Bridge file {} unusable ({}), using demo dataset", path, e);
            BridgeData::demo()
        }),
        None => BridgeData::demo(),
    };

    let pipeline = Pipeline::new(Bridge::new(data));
    let queue = ToolQueue::start(pipeline);
    let dispatcher = RequestDispatcher::new(queue);
    let server = McpServer::new(dispatcher);

    tracing::info!("pedef-mcp-server v{} listening on stdio", pedef_mcp::VERSION);
    server.run().await
}
