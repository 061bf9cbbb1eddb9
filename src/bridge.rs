//! Pedef reader bridge - the data source behind the tools
//!
//! The bridge dataset is loaded once at process start, either from the
//! JSON file named by `PEDEF_MCP_BRIDGE_FILE` or from a built-in demo
//! dataset when that file is absent or unreadable.

use std::collections::HashMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{PedefError, Result};

/// One reader session: a paper plus its page texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub paper_id: String,
    pub paper_title: String,
    pub current_page: u32,
    pub page_count: u32,
    pub annotations: u32,
    #[serde(default)]
    pub pages: HashMap<String, String>,
}

/// The full bridge dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeData {
    #[serde(default)]
    pub reader_entrypoints: Vec<String>,
    #[serde(default)]
    pub developer_entrypoints: Vec<String>,
    #[serde(default)]
    pub sessions: HashMap<String, Session>,
}

impl BridgeData {
    /// Read and parse a dataset file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The built-in demonstration dataset
    pub fn demo() -> Self {
        let mut pages = HashMap::new();
        pages.insert(
            "0".to_string(),
            "This is a demo page text for MCP integration.".to_string(),
        );
        pages.insert(
            "1".to_string(),
            "Figure 1 compares model variants and reports F1 scores.".to_string(),
        );
        pages.insert("2".to_string(), "Conclusion and future work.".to_string());

        let mut sessions = HashMap::new();
        sessions.insert(
            "demo-session".to_string(),
            Session {
                session_id: "demo-session".to_string(),
                paper_id: "demo-paper".to_string(),
                paper_title: "Demo Paper".to_string(),
                current_page: 0,
                page_count: 3,
                annotations: 0,
                pages,
            },
        );

        Self {
            reader_entrypoints: [
                "pdf.open",
                "pdf.close",
                "pdf.list_pages",
                "pdf.get_text",
                "pdf.capture_region",
                "pdf.caption_region",
                "pdf.add_source_annotation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            developer_entrypoints: ["dev.capture_page", "dev.snapshot_reader_state"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sessions,
        }
    }
}

/// The bridge capability invoked by the execution pipeline
#[derive(Debug)]
pub struct Bridge {
    data: BridgeData,
}

impl Bridge {
    pub fn new(data: BridgeData) -> Self {
        Self { data }
    }

    fn session(&self, args: &Value) -> Result<&Session> {
        let session_id = args
            .get("session_id")
            .and_then(|v| v.as_str())
            .unwrap_or("<missing>");
        self.data
            .sessions
            .get(session_id)
            .ok_or_else(|| PedefError::UnknownSession(session_id.to_string()))
    }

    /// List reader and developer entrypoints
    pub fn list_entrypoints(&self) -> Result<Value> {
        Ok(json!({
            "reader": self.data.reader_entrypoints,
            "developer": self.data.developer_entrypoints,
        }))
    }

    /// Get source-linked text for a single page or a page range
    pub fn get_text(&self, args: &Value) -> Result<Value> {
        let session = self.session(args)?;
        let session_id = &session.session_id;

        if let Some(page_index) = args.get("page_index").and_then(|v| v.as_i64()) {
            let text = session
                .pages
                .get(&page_index.to_string())
                .cloned()
                .unwrap_or_default();
            return Ok(json!({
                "text": text,
                "sources": [{"session_id": session_id, "page_index": page_index}],
                "spans": [],
            }));
        }

        let page_start = args.get("page_start").and_then(|v| v.as_i64());
        let page_end = args.get("page_end_exclusive").and_then(|v| v.as_i64());
        if let (Some(start), Some(end)) = (page_start, page_end) {
            let mut parts = Vec::new();
            let mut sources = Vec::new();
            for index in start..end {
                parts.push(
                    session
                        .pages
                        .get(&index.to_string())
                        .cloned()
                        .unwrap_or_default(),
                );
                sources.push(json!({"session_id": session_id, "page_index": index}));
            }
            return Ok(json!({
                "text": parts.join("\n\n"),
                "sources": sources,
                "spans": [],
            }));
        }

        Err(PedefError::InvalidArguments(
            "Provide page_index or page_start/page_end_exclusive.".to_string(),
        ))
    }

    /// Capture an image region of a page
    pub fn capture_region(&self, args: &Value) -> Result<Value> {
        let session = self.session(args)?;
        let session_id = session.session_id.clone();

        let page_index = args.get("page_index").cloned().unwrap_or(Value::Null);
        let rect = args.get("rect").cloned().unwrap_or(Value::Null);
        let appearance = args
            .get("appearance")
            .and_then(|v| v.as_str())
            .unwrap_or("system")
            .to_string();

        let pseudo_image = BASE64.encode(format!(
            "pedef-mock-image:{}:{}:{}:{}",
            session_id, page_index, rect, appearance
        ));

        Ok(json!({
            "mime_type": "image/png",
            "image_base64": pseudo_image,
            "source": {
                "session_id": session_id,
                "page_index": page_index,
                "rect": rect,
                "appearance": appearance,
            },
        }))
    }

    /// Derive a caption and supporting evidence for a page region
    pub fn caption_region(&self, args: &Value) -> Result<Value> {
        let session_id = args.get("session_id").cloned().unwrap_or(Value::Null);
        let page_index_arg = args.get("page_index").cloned().unwrap_or(Value::Null);

        // Only the single-page selector is forwarded; range arguments
        // do not apply to captioning.
        let text_payload = self.get_text(&json!({
            "session_id": session_id,
            "page_index": page_index_arg,
        }))?;
        let text = text_payload
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        let page_index = page_index_arg.as_i64().unwrap_or(0);
        let page_label = page_index + 1;
        let lower = text.to_lowercase();
        let excerpt: String = text.chars().take(120).collect();

        let caption = if lower.contains("figure") || lower.contains("fig.") {
            format!("Figure-oriented region on page {}. {}", page_label, excerpt)
        } else if !text.is_empty() {
            format!("Captured region on page {}. {}", page_label, excerpt)
        } else {
            format!("Captured region on page {}.", page_label)
        };

        let confidence = if text.len() > 40 { 0.82 } else { 0.58 };
        let evidence = if text.is_empty() {
            vec!["Image only"]
        } else {
            vec!["Local page text context"]
        };

        Ok(json!({
            "caption": caption,
            "confidence": confidence,
            "evidence": evidence,
            "source": {
                "session_id": session_id,
                "page_index": page_index,
                "rect": args.get("rect").cloned().unwrap_or(Value::Null),
            },
        }))
    }

    /// Snapshot the session state without page contents
    pub fn snapshot_state(&self, args: &Value) -> Result<Value> {
        let session = self.session(args)?;
        Ok(json!({
            "session_id": session.session_id,
            "paper_id": session.paper_id,
            "paper_title": session.paper_title,
            "current_page": session.current_page,
            "page_count": session.page_count,
            "annotations": session.annotations,
        }))
    }
}
