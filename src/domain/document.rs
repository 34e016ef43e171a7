use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata parsed from a document's front matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Build metadata from a flat key/value map, lifting a string `title`.
    pub fn from_map(mut fields: Map<String, Value>) -> Self {
        let title = match fields.remove("title") {
            Some(Value::String(title)) if !title.trim().is_empty() => Some(title),
            Some(other @ (Value::Number(_) | Value::Bool(_))) => Some(other.to_string()),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(other) => {
                fields.insert("title".to_string(), other);
                None
            }
        };

        Self {
            title,
            extra: fields,
        }
    }
}

/// Cheap identity of a source file used to validate cached renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

/// Raw document as read from the document root.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub slug: String,
    pub metadata: Metadata,
    pub body: String,
    pub fingerprint: SourceFingerprint,
}

/// A heading exposed in a document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingNode {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Fully rendered document ready for a page or the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub slug: String,
    pub html: String,
    pub title: String,
    pub reading_time_minutes: u32,
    pub outline: Vec<HeadingNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
