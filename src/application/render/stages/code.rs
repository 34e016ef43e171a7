use std::sync::Arc;

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::warn;

use crate::application::render::pipeline::{RenderContext, TreeStage};
use crate::application::render::service::{Highlighter, PLAIN_LANGUAGE};
use crate::application::render::types::RenderError;

/// Class of the line-number gutter placed before `<code>`.
pub const LINE_NUMBERS_CLASS: &str = "line-numbers";

/// Replaces fenced and indented code blocks with highlighted markup through
/// a [`Highlighter`] back-end.
///
/// Blocks without a language, or with one the back-end does not know, keep
/// their escaped text and are tagged with the declared language (`text`
/// when none is given).
pub struct CodeHighlight {
    highlighter: Arc<dyn Highlighter>,
    line_numbers: bool,
}

impl CodeHighlight {
    pub fn new(highlighter: Arc<dyn Highlighter>) -> Self {
        Self {
            highlighter,
            line_numbers: false,
        }
    }

    /// Prefix every block with a gutter numbering its lines.
    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.line_numbers = enabled;
        self
    }

    fn block_html(&self, language: Option<&str>, literal: &str, slug: &str) -> String {
        let supported = language.filter(|lang| self.highlighter.supports_language(lang));

        let highlighted = supported.and_then(|lang| match self.highlighter.highlight(literal, lang) {
            Ok(html) => Some(html),
            Err(err) => {
                warn!(
                    target = "application::render::highlight",
                    slug = %slug,
                    language = lang,
                    error = %err,
                    "highlighting failed; rendering block as plain text"
                );
                None
            }
        });

        let pre_class = highlighted
            .as_ref()
            .map(|_| " class=\"syntax-highlight\"")
            .unwrap_or_default();
        let data_language = encode_double_quoted_attribute(language.unwrap_or(PLAIN_LANGUAGE));
        let code_class = language
            .map(|lang| format!(" class=\"language-{}\"", encode_double_quoted_attribute(lang)))
            .unwrap_or_default();

        let line_count = literal.lines().count();
        let (line_attr, gutter) = if self.line_numbers && line_count > 0 {
            let numbers: String = (1..=line_count)
                .map(|line| format!("<span>{line}</span>\n"))
                .collect();
            (
                format!(" data-line-numbers=\"{line_count}\""),
                format!("<span class=\"{LINE_NUMBERS_CLASS}\" aria-hidden=\"true\">{numbers}</span>"),
            )
        } else {
            (String::new(), String::new())
        };

        let body = match highlighted {
            Some(body) => body,
            None => encode_text(literal).into_owned(),
        };

        let mut html = format!("<pre{pre_class} data-language=\"{data_language}\"{line_attr}>");
        html.push_str(&gutter);
        html.push_str(&format!("<code{code_class}>"));
        html.push_str(&body);
        html.push_str("</code></pre>\n");
        html
    }
}

impl TreeStage for CodeHighlight {
    fn name(&self) -> &'static str {
        "code-highlight"
    }

    fn apply<'a>(&self, root: &'a AstNode<'a>, context: &mut RenderContext) -> Result<(), RenderError> {
        for node in root.descendants() {
            let Some((info, literal)) = extract_code_block(node) else {
                continue;
            };
            context.code_blocks = context.code_blocks.saturating_add(1);

            let language = info.split_whitespace().next().map(str::to_ascii_lowercase);
            let html = self.block_html(language.as_deref(), &literal, &context.slug);

            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }

        Ok(())
    }
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some((block.info.trim().to_string(), block.literal.clone()))
    } else {
        None
    }
}
