use std::cell::RefCell;

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{Options, format_html};
use html_escape::encode_double_quoted_attribute;
use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::application::render::pipeline::{
    HeadingInfo, RenderContext, TreeStage, heading_level, heading_nodes,
};
use crate::application::render::types::RenderError;
use crate::dom;
use crate::domain::slug::AnchorSlugger;

use super::collect_inline_text;

/// Assigns deterministic, document-unique ids to every markdown heading.
///
/// Ids written in raw HTML are trimmed and kept, and generated anchors never
/// collide with them. A raw heading repeating an id that an earlier raw
/// heading already claimed is given a numeric suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingIds;

impl TreeStage for HeadingIds {
    fn name(&self) -> &'static str {
        "heading-ids"
    }

    fn apply<'a>(&self, root: &'a AstNode<'a>, context: &mut RenderContext) -> Result<(), RenderError> {
        let slugger = RefCell::new(AnchorSlugger::new());

        for node in root.descendants() {
            let mut data = node.data.borrow_mut();
            let literal = match &mut data.value {
                NodeValue::HtmlBlock(block) => &mut block.literal,
                NodeValue::HtmlInline(html) => html,
                _ => continue,
            };
            if !literal.contains("id") {
                continue;
            }
            *literal = claim_raw_ids(literal, &slugger)
                .map_err(|message| RenderError::stage(self.name(), message))?;
        }

        let mut slugger = slugger.into_inner();
        for node in heading_nodes(root) {
            let Some(level) = heading_level(node) else {
                continue;
            };
            let text = collect_inline_text(node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let id = slugger.anchor_for(&text);
            context.headings.push(HeadingInfo {
                id,
                text,
                level,
                self_link: false,
            });
        }

        Ok(())
    }
}

/// Rewrites `id` attributes inside one raw HTML literal. Heading ids are
/// trimmed and claimed; other ids are only reserved.
fn claim_raw_ids(literal: &str, slugger: &RefCell<AnchorSlugger>) -> Result<String, String> {
    rewrite_str(
        literal,
        RewriteStrSettings {
            element_content_handlers: vec![element!("[id]", |el| {
                let Some(raw) = el.get_attribute("id") else {
                    return Ok(());
                };
                let trimmed = raw.trim();
                let is_heading = dom::heading_level(&el.tag_name().to_ascii_lowercase()).is_some();
                let mut slugger = slugger.borrow_mut();

                if !is_heading {
                    if !trimmed.is_empty() {
                        slugger.reserve(trimmed);
                    }
                    return Ok(());
                }
                if trimmed.is_empty() {
                    el.remove_attribute("id");
                    return Ok(());
                }
                let claimed = slugger.claim(trimmed);
                if claimed != raw {
                    el.set_attribute("id", &claimed)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| err.to_string())
}

/// Marks identified headings for a self-link unless their content already
/// contains a link.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingSelfLinks;

impl TreeStage for HeadingSelfLinks {
    fn name(&self) -> &'static str {
        "heading-self-links"
    }

    fn apply<'a>(&self, root: &'a AstNode<'a>, context: &mut RenderContext) -> Result<(), RenderError> {
        for (node, info) in heading_nodes(root).into_iter().zip(context.headings.iter_mut()) {
            // Nested anchors are invalid.
            info.self_link = !contains_link(node);
        }
        Ok(())
    }
}

fn contains_link<'a>(heading: &'a AstNode<'a>) -> bool {
    heading.descendants().any(|node| match &node.data.borrow().value {
        NodeValue::Link(_) => true,
        NodeValue::HtmlInline(html) => {
            let tag = html.trim_start().to_ascii_lowercase();
            tag.starts_with("<a ") || tag.starts_with("<a>")
        }
        _ => false,
    })
}

/// Replace each markdown heading with its final markup: the id recorded by
/// [`HeadingIds`] and, when requested, an anchor around the content.
pub(crate) fn write_headings<'a>(
    root: &'a AstNode<'a>,
    headings: &[HeadingInfo],
    options: &Options<'_>,
) -> Result<(), RenderError> {
    for (node, info) in heading_nodes(root).into_iter().zip(headings) {
        let mut inner = String::new();
        let mut child = node.first_child();
        while let Some(next) = child {
            format_html(next, options, &mut inner).map_err(|err| RenderError::Document {
                message: err.to_string(),
            })?;
            child = next.next_sibling();
        }

        let id = encode_double_quoted_attribute(&info.id);
        let content = if info.self_link {
            format!("<a class=\"anchor\" href=\"#{id}\">{inner}</a>")
        } else {
            inner
        };
        let html = format!(
            "<h{level} id=\"{id}\">{content}</h{level}>\n",
            level = info.level
        );

        {
            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }
        while let Some(child) = node.first_child() {
            child.detach();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use comrak::{Arena, parse_document};

    use super::*;

    fn options() -> Options<'static> {
        let mut options = Options::default();
        options.render.r#unsafe = true;
        options
    }

    fn run(markdown: &str, self_links: bool) -> (String, RenderContext) {
        let arena = Arena::new();
        let options = options();
        let root = parse_document(&arena, markdown, &options);
        let mut context = RenderContext::new("doc");
        HeadingIds.apply(root, &mut context).expect("ids");
        if self_links {
            HeadingSelfLinks.apply(root, &mut context).expect("links");
        }
        write_headings(root, &context.headings, &options).expect("write");

        let mut html = String::new();
        format_html(root, &options, &mut html).expect("html");
        (html, context)
    }

    fn ids(context: &RenderContext) -> Vec<&str> {
        context.headings.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn duplicate_headings_get_numeric_suffixes() {
        let (html, context) = run("## Setup\n\n### Setup\n\n## Setup\n", false);
        assert_eq!(ids(&context), vec!["setup", "setup-2", "setup-3"]);
        assert!(html.contains("<h3 id=\"setup-2\">Setup</h3>"));
    }

    #[test]
    fn raw_ids_win_over_generated_ones() {
        let (html, context) = run("## Intro\n\n<h2 id=\"intro\">Manual</h2>\n", false);
        assert_eq!(ids(&context), vec!["intro-2"]);
        assert!(html.contains("<h2 id=\"intro\">Manual</h2>"));
    }

    #[test]
    fn raw_heading_ids_are_trimmed_in_the_markup() {
        let (html, _) = run("<h2 id=\" spaced \">Spaced</h2>\n\n## Next\n", true);
        assert!(html.contains("<h2 id=\"spaced\">Spaced</h2>"));
        assert!(!html.contains(" spaced "));
        assert!(html.contains("<h2 id=\"next\">"));
    }

    #[test]
    fn repeated_raw_heading_ids_are_suffixed() {
        let (html, _) = run("<h2 id=\"dup\">One</h2>\n\n<h2 id=\"dup\">Two</h2>\n\n## Dup\n", false);
        assert!(html.contains("<h2 id=\"dup\">One</h2>"));
        assert!(html.contains("<h2 id=\"dup-2\">Two</h2>"));
        assert!(html.contains("<h2 id=\"dup-3\">Dup</h2>"));
    }

    #[test]
    fn script_bodies_are_not_scanned_for_ids() {
        let (html, context) = run(
            "<script>if (a < b && c > d) { x(\"<h2 id='fake'>\"); }</script>\n\n## After Script\n",
            true,
        );
        assert_eq!(ids(&context), vec!["after-script"]);
        assert!(html.contains("<h2 id='fake'>"));
        assert!(html.contains("<h2 id=\"after-script\"><a class=\"anchor\" href=\"#after-script\">After Script</a></h2>"));
    }

    #[test]
    fn headings_without_text_use_fallback() {
        let (_, context) = run("##\n\n## !!!\n", false);
        assert_eq!(ids(&context), vec!["section", "section-2"]);
    }

    #[test]
    fn self_links_wrap_heading_content() {
        let (html, _) = run("## Hello <code>world</code>\n", true);
        assert!(html.contains(
            "<h2 id=\"hello-world\"><a class=\"anchor\" href=\"#hello-world\">Hello <code>world</code></a></h2>"
        ));
    }

    #[test]
    fn self_links_skip_headings_that_already_link() {
        let (html, _) = run("## [X](/x)\n", true);
        assert!(html.contains("<h2 id=\"x\"><a href=\"/x\">X</a></h2>"));
    }
}
