mod augment;
mod highlight;
mod options;

use std::sync::Arc;

use comrak::{Arena, format_html, parse_document};
use serde::Deserialize;

use crate::application::render::pipeline::{Pipeline, RenderContext};
use crate::application::render::stages::{
    CodeHighlight, HeadingIds, HeadingSelfLinks, write_headings,
};
use crate::application::render::types::{RenderError, RenderOutput, RenderRequest, RenderService};
use crate::dom::HtmlTree;

pub use highlight::{Highlighter, PLAIN_LANGUAGE, PlainHighlighter, SyntectHighlighter, THEME_CSS};

use augment::augment_semantics;
use options::default_options;

/// Highlighting back-end selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightBackend {
    #[default]
    Syntect,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPipelineConfig {
    pub highlight: HighlightBackend,
    pub heading_self_links: bool,
    pub line_numbers: bool,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            highlight: HighlightBackend::Syntect,
            heading_self_links: true,
            line_numbers: true,
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            highlight: settings.highlight,
            heading_self_links: settings.heading_self_links,
            line_numbers: settings.line_numbers,
        }
    }
}

/// Comrak-based rendering pipeline: markdown is parsed into a syntax tree,
/// run through the tree stages, serialized and given a streaming attribute
/// pass. Headings are read back from the final markup, so the reported
/// outline always matches the ids a browser sees.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    pipeline: Pipeline,
}

impl ComrakRenderService {
    pub fn new(config: RenderPipelineConfig) -> Self {
        let highlighter: Arc<dyn Highlighter> = match config.highlight {
            HighlightBackend::Syntect => Arc::new(SyntectHighlighter::new()),
            HighlightBackend::Plain => Arc::new(PlainHighlighter),
        };

        let mut pipeline = Pipeline::new().with_stage(HeadingIds);
        if config.heading_self_links {
            pipeline = pipeline.with_stage(HeadingSelfLinks);
        }
        pipeline = pipeline
            .with_stage(CodeHighlight::new(highlighter).with_line_numbers(config.line_numbers));

        Self::with_pipeline(pipeline)
    }

    /// Build a renderer around a caller-assembled stage list.
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            options: default_options(),
            pipeline,
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new(RenderPipelineConfig::default())
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let mut context = RenderContext::new(request.slug.as_str());
        self.pipeline.run(root, &mut context)?;
        write_headings(root, &context.headings, &self.options)?;

        let mut converted = String::new();
        format_html(root, &self.options, &mut converted).map_err(|err| RenderError::Parse {
            message: err.to_string(),
        })?;
        let html = augment_semantics(&converted)?;

        let headings = HtmlTree::parse(&html).headings();

        Ok(RenderOutput {
            html,
            headings,
            code_blocks: context.code_blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> RenderOutput {
        ComrakRenderService::default()
            .render(&RenderRequest::new("doc", markdown))
            .expect("render")
    }

    #[test]
    fn default_pipeline_stage_order() {
        assert_eq!(
            ComrakRenderService::default().stage_names(),
            vec!["heading-ids", "heading-self-links", "code-highlight"]
        );
    }

    #[test]
    fn self_links_can_be_disabled_without_touching_ids() {
        let service = ComrakRenderService::new(RenderPipelineConfig {
            heading_self_links: false,
            ..RenderPipelineConfig::default()
        });
        let output = service
            .render(&RenderRequest::new("doc", "## Title\n"))
            .expect("render");
        assert_eq!(output.html.trim(), "<h2 id=\"title\">Title</h2>");
    }

    #[test]
    fn headings_are_anchored_and_recorded() {
        let output = render("# Guide\n\n## Install\n\n### Install\n");
        assert!(output.html.contains(
            "<h2 id=\"install\"><a class=\"anchor\" href=\"#install\" data-link-kind=\"anchor\">Install</a></h2>"
        ));
        let ids: Vec<_> = output.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["guide", "install", "install-2"]);
        assert_eq!(output.headings[2].level, 3);
    }

    #[test]
    fn rendering_is_deterministic() {
        let markdown = "## A\n\n```rust\nlet a = 1;\n```\n\n## A\n";
        assert_eq!(render(markdown), render(markdown));
    }

    #[test]
    fn unterminated_fence_renders_literally() {
        let output = render("## Start\n\n```python\nprint('x')\nstill code\n");
        assert!(output.html.contains("<pre"));
        assert!(output.html.contains("still code"));
        assert_eq!(output.code_blocks, 1);
    }

    #[test]
    fn raw_html_ids_are_respected() {
        let output = render("<h2 id=\"custom\">Custom</h2>\n\n## Custom\n");
        let ids: Vec<_> = output.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["custom", "custom-2"]);
    }

    fn ids(output: &RenderOutput) -> Vec<&str> {
        output.headings.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn named_entities_in_raw_html_pass_through() {
        let output = render("<p>a &times; b &rarr; c &eacute;</p>\n");
        assert_eq!(output.html.trim(), "<p>a &times; b &rarr; c &eacute;</p>");
    }

    #[test]
    fn script_bodies_do_not_swallow_later_content() {
        let output = render("<script>if (a < b && c > d) { x(); }</script>\n\n## After Script\n");
        assert!(output.html.starts_with("<script>if (a < b && c > d) { x(); }</script>\n"));
        assert!(output.html.contains("<h2 id=\"after-script\">"));
        assert_eq!(ids(&output), vec!["after-script"]);
    }

    #[test]
    fn unclosed_paragraph_in_raw_block_keeps_heading_order() {
        let output = render("<div><p>open\n</div>\n\n## First\n\n## Second\n");
        assert_eq!(ids(&output), vec!["first", "second"]);
        let page = HtmlTree::parse(&output.html);
        assert!(page.select("p h2").expect("select").is_empty());
    }

    #[test]
    fn reported_headings_match_ids_in_the_markup() {
        let output = render("<h2 id=\" spaced \">Spaced</h2>\n\n<h2 id=\"dup\">A</h2>\n\n<h2 id=\"dup\">B</h2>\n\n## Next\n");
        assert_eq!(ids(&output), vec!["spaced", "dup", "dup-2", "next"]);
        for id in ids(&output) {
            assert_eq!(output.html.matches(&format!("id=\"{id}\"")).count(), 1, "{id}");
        }
    }

    #[test]
    fn line_numbers_follow_the_setting() {
        let markdown = "```rust\nlet a = 1;\nlet b = 2;\n```\n";
        assert!(render(markdown).html.contains("data-line-numbers=\"2\""));

        let service = ComrakRenderService::new(RenderPipelineConfig {
            line_numbers: false,
            ..RenderPipelineConfig::default()
        });
        let output = service
            .render(&RenderRequest::new("doc", markdown))
            .expect("render");
        assert!(!output.html.contains("line-numbers"));
    }
}
