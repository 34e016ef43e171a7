use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::document::HeadingNode;

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Slug of the document being rendered, used for diagnostics only.
    pub slug: String,
    /// Markdown body with front matter already stripped.
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(slug: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            markdown: markdown.into(),
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub html: String,
    /// Every heading that received an id, in document order.
    pub headings: Vec<HeadingNode>,
    pub code_blocks: u32,
}

/// Structured errors surfaced by the rendering pipeline. Malformed markdown is
/// never an error; these signal defects in a stage.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown conversion failed: {message}")]
    Parse { message: String },
    #[error("render stage `{stage}` failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
}

impl RenderError {
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}

/// Trait exposed by the rendering pipeline. Implementations must be pure and
/// deterministic: given the same input, they return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
