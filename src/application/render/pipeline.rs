//! Ordered stages applied to the comrak syntax tree between parsing and
//! serialization.
//!
//! Each stage sees the whole document tree plus a shared [`RenderContext`].
//! Stages only communicate through the tree and the context, so adding or
//! removing one never requires touching the others.

use comrak::nodes::{AstNode, NodeValue};
use tracing::trace;

use super::types::RenderError;

/// Markdown heading identified by the id stage, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingInfo {
    pub id: String,
    pub text: String,
    pub level: u8,
    /// Wrap the heading content in a link to its own anchor.
    pub self_link: bool,
}

/// State accumulated while the stages run over one document.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub slug: String,
    pub headings: Vec<HeadingInfo>,
    pub code_blocks: u32,
}

impl RenderContext {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }
}

pub trait TreeStage: Send + Sync {
    /// Stable name reported in errors and traces.
    fn name(&self) -> &'static str;

    fn apply<'a>(&self, root: &'a AstNode<'a>, context: &mut RenderContext) -> Result<(), RenderError>;
}

/// Stages composed left to right.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn TreeStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl TreeStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run<'a>(&self, root: &'a AstNode<'a>, context: &mut RenderContext) -> Result<(), RenderError> {
        for stage in &self.stages {
            trace!(
                target = "application::render::pipeline",
                slug = %context.slug,
                stage = stage.name(),
                "applying stage"
            );
            stage.apply(root, context)?;
        }
        Ok(())
    }
}

/// Markdown headings of the tree, in document order.
pub(crate) fn heading_nodes<'a>(root: &'a AstNode<'a>) -> Vec<&'a AstNode<'a>> {
    root.descendants()
        .filter(|node| heading_level(node).is_some())
        .collect()
}

pub(crate) fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use comrak::nodes::NodeHtmlBlock;
    use comrak::{Arena, Options, format_html, parse_document};

    use super::*;

    /// Appends its name to a raw block that replaces the first paragraph.
    struct Mark(&'static str);

    impl TreeStage for Mark {
        fn name(&self) -> &'static str {
            self.0
        }

        fn apply<'a>(&self, root: &'a AstNode<'a>, _: &mut RenderContext) -> Result<(), RenderError> {
            let Some(first) = root.first_child() else {
                return Err(RenderError::stage(self.0, "empty document"));
            };
            let mut data = first.data.borrow_mut();
            let mut literal = match &data.value {
                NodeValue::HtmlBlock(block) => block.literal.clone(),
                _ => String::new(),
            };
            literal.push_str(self.0);
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal,
            });
            while let Some(child) = first.first_child() {
                child.detach();
            }
            Ok(())
        }
    }

    struct Fails;

    impl TreeStage for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn apply<'a>(&self, _: &'a AstNode<'a>, _: &mut RenderContext) -> Result<(), RenderError> {
            Err(RenderError::stage("fails", "boom"))
        }
    }

    fn serialize<'a>(root: &'a AstNode<'a>, options: &Options<'_>) -> String {
        let mut html = String::new();
        format_html(root, options, &mut html).expect("html");
        html
    }

    #[test]
    fn stages_run_in_insertion_order() {
        let arena = Arena::new();
        let mut options = Options::default();
        options.render.r#unsafe = true;
        let root = parse_document(&arena, "text\n", &options);
        let pipeline = Pipeline::new().with_stage(Mark("a")).with_stage(Mark("b"));
        let mut context = RenderContext::new("doc");

        pipeline.run(root, &mut context).expect("run");

        assert_eq!(pipeline.stage_names(), vec!["a", "b"]);
        assert_eq!(serialize(root, &options).trim(), "ab");
    }

    #[test]
    fn failing_stage_stops_the_pipeline() {
        let arena = Arena::new();
        let options = Options::default();
        let root = parse_document(&arena, "text\n", &options);
        let pipeline = Pipeline::new()
            .with_stage(Fails)
            .with_stage(Mark("after"));
        let mut context = RenderContext::new("doc");

        let err = pipeline.run(root, &mut context).expect_err("must fail");
        assert!(matches!(err, RenderError::Stage { stage: "fails", .. }));
        assert_eq!(serialize(root, &options), "<p>text</p>\n");
    }

    #[test]
    fn heading_nodes_are_listed_in_document_order() {
        let arena = Arena::new();
        let options = Options::default();
        let root = parse_document(&arena, "# A\n\n> ## B\n\nSetext\n---\n", &options);

        let levels: Vec<_> = heading_nodes(root)
            .into_iter()
            .filter_map(heading_level)
            .collect();
        assert_eq!(levels, vec![1, 2, 2]);
    }
}
