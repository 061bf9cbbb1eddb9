//! Error types for pedef-mcp

use thiserror::Error;

/// Result type alias for pedef-mcp operations
pub type Result<T> = std::result::Result<T, PedefError>;

/// Main error type for pedef-mcp
#[derive(Error, Debug)]
pub enum PedefError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown session_id: {0}")]
    UnknownSession(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    PayloadValidation(String),

    #[error("Execution queue error: {0}")]
    Queue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
