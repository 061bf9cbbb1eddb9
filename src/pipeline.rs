//! Tool execution pipeline: Integrate -> Review -> Finalize
//!
//! Every queued tool call passes through the same three stages. The
//! integrator routes the call to a bridge capability, the reviewer
//! checks the structural shape of the returned payload, and the runner
//! wraps it with provenance metadata.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::error::{PedefError, Result};

/// The closed set of tools the pipeline knows how to integrate.
///
/// Adding or removing a tool is an exhaustive, compile-checked change
/// here and in the registry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListEntrypoints,
    GetText,
    CaptureRegion,
    CaptionRegion,
    SnapshotState,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "reader.list_entrypoints" => Some(Self::ListEntrypoints),
            "reader.get_text" => Some(Self::GetText),
            "reader.capture_region" => Some(Self::CaptureRegion),
            "reader.caption_region" => Some(Self::CaptionRegion),
            "reader.snapshot_state" => Some(Self::SnapshotState),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListEntrypoints => "reader.list_entrypoints",
            Self::GetText => "reader.get_text",
            Self::CaptureRegion => "reader.capture_region",
            Self::CaptionRegion => "reader.caption_region",
            Self::SnapshotState => "reader.snapshot_state",
        }
    }
}

/// Finalized output of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub tool: String,
    pub produced_at: String,
    pub payload: Value,
}

/// The fixed three-stage pipeline applied to every tool call
#[derive(Debug)]
pub struct Pipeline {
    bridge: Bridge,
}

impl Pipeline {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Run all three stages for one tool call
    pub fn run(&self, tool: ToolKind, args: &Value) -> Result<PipelineResult> {
        let payload = self.integrate(tool, args)?;
        let payload = self.review(tool, payload)?;
        Ok(self.finalize(tool, payload))
    }

    /// Integrator stage: route the call to the bridge capability
    fn integrate(&self, tool: ToolKind, args: &Value) -> Result<Value> {
        match tool {
            ToolKind::ListEntrypoints => self.bridge.list_entrypoints(),
            ToolKind::GetText => self.bridge.get_text(args),
            ToolKind::CaptureRegion => self.bridge.capture_region(args),
            ToolKind::CaptionRegion => self.bridge.caption_region(args),
            ToolKind::SnapshotState => self.bridge.snapshot_state(args),
        }
    }

    /// Reviewer stage: validate the payload shape per tool kind
    fn review(&self, tool: ToolKind, payload: Value) -> Result<Value> {
        match tool {
            ToolKind::CaptureRegion => {
                let has_image = payload
                    .get("image_base64")
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| !s.is_empty());
                let has_mime = payload
                    .get("mime_type")
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| !s.is_empty());
                if !has_image || !has_mime {
                    return Err(PedefError::PayloadValidation(
                        "Capture payload missing image metadata.".to_string(),
                    ));
                }
            }
            ToolKind::GetText => {
                if payload.get("text").map(|v| v.is_string()) != Some(true) {
                    return Err(PedefError::PayloadValidation(
                        "Text payload missing text field.".to_string(),
                    ));
                }
            }
            ToolKind::CaptionRegion => {
                if payload.get("caption").map(|v| v.is_string()) != Some(true) {
                    return Err(PedefError::PayloadValidation(
                        "Caption payload missing caption field.".to_string(),
                    ));
                }
            }
            ToolKind::ListEntrypoints | ToolKind::SnapshotState => {}
        }
        Ok(payload)
    }

    /// Runner stage: wrap the reviewed payload with provenance metadata
    fn finalize(&self, tool: ToolKind, payload: Value) -> PipelineResult {
        PipelineResult {
            tool: tool.as_str().to_string(),
            produced_at: Utc::now().to_rfc3339(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeData;
    use serde_json::json;

    fn pipeline() -> Pipeline {
        Pipeline::new(Bridge::new(BridgeData::demo()))
    }

    #[test]
    fn tool_kind_round_trips() {
        for name in [
            "reader.list_entrypoints",
            "reader.get_text",
            "reader.capture_region",
            "reader.caption_region",
            "reader.snapshot_state",
        ] {
            let kind = ToolKind::from_name(name).unwrap();
            assert_eq!(kind.as_str(), name);
        }
        assert!(ToolKind::from_name("reader.unknown").is_none());
    }

    #[test]
    fn run_wraps_payload_with_provenance() {
        let args = json!({"session_id": "demo-session", "page_index": 0});
        let result = pipeline().run(ToolKind::GetText, &args).unwrap();
        assert_eq!(result.tool, "reader.get_text");
        assert!(!result.produced_at.is_empty());
        assert!(result.payload["text"].is_string());
    }

    #[test]
    fn reviewer_rejects_text_payload_without_text() {
        let err = pipeline()
            .review(ToolKind::GetText, json!({"sources": []}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Text payload missing text field.");
    }

    #[test]
    fn reviewer_rejects_capture_payload_without_image() {
        let err = pipeline()
            .review(ToolKind::CaptureRegion, json!({"mime_type": "image/png"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Capture payload missing image metadata.");
    }

    #[test]
    fn reviewer_rejects_caption_payload_without_caption() {
        let err = pipeline()
            .review(ToolKind::CaptionRegion, json!({"confidence": 0.5}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Caption payload missing caption field.");
    }

    #[test]
    fn integrator_surfaces_bridge_errors() {
        let args = json!({"session_id": "missing", "page_index": 0});
        let err = pipeline().run(ToolKind::SnapshotState, &args).unwrap_err();
        assert_eq!(err.to_string(), "Unknown session_id: missing");
    }
}
