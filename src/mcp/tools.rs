//! MCP tool definitions for the Pedef reader bridge

use serde_json::json;

use super::protocol::ToolDefinition;

/// The fixed tool registry: (name, description, input schema).
/// Listing order is significant and never changes at runtime.
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    (
        "reader.list_entrypoints",
        "List reader and developer entrypoints exposed by Pedef bridge.",
        r#"{
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }"#,
    ),
    (
        "reader.get_text",
        "Get source-linked text payload by session and page or page range.",
        r#"{
            "type": "object",
            "properties": {
                "session_id": {"type": "string"},
                "page_index": {"type": "integer", "minimum": 0},
                "page_start": {"type": "integer", "minimum": 0},
                "page_end_exclusive": {"type": "integer", "minimum": 1}
            },
            "required": ["session_id"],
            "additionalProperties": false
        }"#,
    ),
    (
        "reader.capture_region",
        "Capture internal reader image region with appearance control.",
        r#"{
            "type": "object",
            "properties": {
                "session_id": {"type": "string"},
                "page_index": {"type": "integer", "minimum": 0},
                "rect": {
                    "type": "object",
                    "properties": {
                        "x": {"type": "number"},
                        "y": {"type": "number"},
                        "width": {"type": "number", "exclusiveMinimum": 0},
                        "height": {"type": "number", "exclusiveMinimum": 0}
                    },
                    "required": ["x", "y", "width", "height"],
                    "additionalProperties": false
                },
                "appearance": {"type": "string", "enum": ["system", "light", "dark"]}
            },
            "required": ["session_id", "page_index", "rect"],
            "additionalProperties": false
        }"#,
    ),
    (
        "reader.caption_region",
        "Create caption and evidence from captured region.",
        r#"{
            "type": "object",
            "properties": {
                "session_id": {"type": "string"},
                "page_index": {"type": "integer", "minimum": 0},
                "rect": {
                    "type": "object",
                    "properties": {
                        "x": {"type": "number"},
                        "y": {"type": "number"},
                        "width": {"type": "number", "exclusiveMinimum": 0},
                        "height": {"type": "number", "exclusiveMinimum": 0}
                    },
                    "required": ["x", "y", "width", "height"],
                    "additionalProperties": false
                },
                "appearance": {"type": "string", "enum": ["system", "light", "dark"]}
            },
            "required": ["session_id", "page_index"],
            "additionalProperties": false
        }"#,
    ),
    (
        "reader.snapshot_state",
        "Inspect current paper/session state for development workflows.",
        r#"{
            "type": "object",
            "properties": {
                "session_id": {"type": "string"}
            },
            "required": ["session_id"],
            "additionalProperties": false
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}

/// Exact-name lookup against the registry
pub fn find_tool(name: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    TOOL_DEFINITIONS.iter().find(|(n, _, _)| *n == name)
}
