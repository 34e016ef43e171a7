//! Markdown rendering pipeline.
//!
//! The pipeline is pure: it accepts markdown input, produces deterministic
//! HTML output and surfaces structured errors. Loading, caching and metrics
//! happen in the caller.

pub mod pipeline;
mod service;
pub mod stages;
mod types;

pub use pipeline::{HeadingInfo, Pipeline, RenderContext, TreeStage};
pub use service::{
    ComrakRenderService, HighlightBackend, Highlighter, PLAIN_LANGUAGE, PlainHighlighter,
    RenderPipelineConfig, SyntectHighlighter, THEME_CSS,
};
pub use types::{RenderError, RenderOutput, RenderRequest, RenderService};
