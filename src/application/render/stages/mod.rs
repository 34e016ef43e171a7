//! Syntax-tree stages of the documentation pipeline.

mod code;
mod headings;

use comrak::nodes::{AstNode, NodeValue};

pub use code::CodeHighlight;
pub use headings::{HeadingIds, HeadingSelfLinks};

pub(crate) use headings::write_headings;

/// Plain text of an inline subtree; code spans contribute their literal and
/// line breaks become spaces.
pub(crate) fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}
