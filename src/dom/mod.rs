//! Headless HTML tree used by the reader-side enhancements and by the
//! outline reader.
//!
//! Parsing goes through `kuchikikiki` (html5ever), so the tree is the one a
//! browser builds from the same markup: raw-text elements such as `<script>`
//! stay opaque and misnested tags are repaired by the standard algorithm.
//! Nodes are reference counted; a [`NodeRef`] keeps its identity when the
//! node is moved, the same way a browser keeps element references alive
//! across re-parenting.

use kuchikikiki::parse_html;
use kuchikikiki::traits::TendrilSink;
use thiserror::Error;

use crate::domain::document::HeadingNode;

pub use kuchikikiki::NodeRef;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("invalid selector `{selector}`")]
    Selector { selector: String },
    #[error("markup `{markup}` does not contain an element")]
    EmptyFragment { markup: String },
}

/// A parsed HTML fragment.
///
/// Cloning is shallow: clones share the same nodes.
#[derive(Debug, Clone)]
pub struct HtmlTree {
    document: NodeRef,
    body: NodeRef,
}

impl HtmlTree {
    /// Parse `html` as the content of a document body.
    pub fn parse(html: &str) -> Self {
        // An explicit body keeps leading `<script>`/`<style>` out of `<head>`.
        let document = parse_html().one(format!("<!DOCTYPE html><body>{html}"));
        let body = document
            .select_first("body")
            .map(|body| body.as_node().clone())
            .unwrap_or_else(|()| document.clone());
        Self { document, body }
    }

    /// Document node; two trees are the same instance when their roots are equal.
    pub fn root(&self) -> &NodeRef {
        &self.document
    }

    /// Elements matching a CSS selector, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeRef>, DomError> {
        let matches = self.body.select(selector).map_err(|()| DomError::Selector {
            selector: selector.to_string(),
        })?;
        Ok(matches.map(|element| element.as_node().clone()).collect())
    }

    /// Every heading carrying a non-blank id, in document order.
    pub fn headings(&self) -> Vec<HeadingNode> {
        self.body
            .descendants()
            .filter_map(|node| {
                let level = tag_name(&node).as_deref().and_then(heading_level)?;
                let id = attr(&node, "id")?.trim().to_string();
                if id.is_empty() {
                    return None;
                }
                Some(HeadingNode {
                    id,
                    text: normalized_text(&node),
                    level,
                })
            })
            .collect()
    }

    /// Serialized body content.
    pub fn to_html(&self) -> String {
        self.body.children().map(|child| child.to_string()).collect()
    }

    /// Build a detached element from a markup snippet.
    pub fn create_element(markup: &str) -> Result<NodeRef, DomError> {
        let scratch = Self::parse(markup);
        let element = scratch
            .body
            .children()
            .find(|child| child.as_element().is_some())
            .ok_or_else(|| DomError::EmptyFragment {
                markup: markup.to_string(),
            })?;
        element.detach();
        Ok(element)
    }
}

pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|element| AsRef::<str>::as_ref(&element.name.local).to_string())
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()?
        .attributes
        .borrow()
        .get(name)
        .map(str::to_string)
}

pub fn set_attr(node: &NodeRef, name: &str, value: impl Into<String>) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().insert(name, value.into());
    }
}

pub fn has_class(node: &NodeRef, class: &str) -> bool {
    attr(node, "class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Replace every child of `node` with a single text node.
pub fn replace_text(node: &NodeRef, text: &str) {
    for child in node.children().collect::<Vec<_>>() {
        child.detach();
    }
    node.append(NodeRef::new_text(text));
}

/// Text content with whitespace runs collapsed to single spaces.
pub fn normalized_text(node: &NodeRef) -> String {
    node.text_contents()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn heading_level(tag: &str) -> Option<u8> {
    let digit = tag.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// Language named by the first `language-<name>` class, if any.
pub fn code_language(class_attr: &str) -> Option<&str> {
    class_attr
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .filter(|language| !language.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_round_trips_through_the_body() {
        let tree = HtmlTree::parse("<p>a <em>b</em></p><pre><code>x &lt; y</code></pre>");
        assert_eq!(
            tree.to_html(),
            "<p>a <em>b</em></p><pre><code>x &lt; y</code></pre>"
        );
    }

    #[test]
    fn leading_script_stays_in_the_body_as_raw_text() {
        let tree = HtmlTree::parse("<script>if (a < b && c > d) { x(); }</script><h2 id=\"after\">After</h2>");
        let scripts = tree.select("script").expect("select");
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].text_contents(), "if (a < b && c > d) { x(); }");
        let ids: Vec<_> = tree.headings().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["after"]);
    }

    #[test]
    fn unclosed_paragraph_does_not_swallow_headings() {
        let tree = HtmlTree::parse("<div><p>open\n<h2 id=\"a\">A</h2></div><h2 id=\"b\">B</h2>");
        let headings = tree.select("p h2").expect("select");
        assert!(headings.is_empty());
        assert_eq!(tree.headings().len(), 2);
    }

    #[test]
    fn moving_a_node_keeps_its_identity() {
        let tree = HtmlTree::parse("<pre><code>x</code></pre>");
        let pre = tree.select("pre").expect("select").remove(0);
        let wrapper = HtmlTree::create_element("<div class=\"w\"></div>").expect("element");

        pre.insert_before(wrapper.clone());
        wrapper.append(pre.clone());

        assert_eq!(pre.parent(), Some(wrapper.clone()));
        assert!(has_class(&wrapper, "w"));
        assert_eq!(tree.to_html(), "<div class=\"w\"><pre><code>x</code></pre></div>");
    }

    #[test]
    fn headings_skip_blank_ids_and_decode_entities() {
        let tree = HtmlTree::parse("<h2 id=\"a\">A &times; B</h2><h3 id=\" \">x</h3><h4>none</h4>");
        let headings = tree.headings();
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "A × B");
        assert_eq!(headings[0].level, 2);
    }

    #[test]
    fn code_language_reads_the_language_class() {
        assert_eq!(code_language("language-rust"), Some("rust"));
        assert_eq!(code_language("hl language-c++ x"), Some("c++"));
        assert_eq!(code_language("language-"), None);
        assert_eq!(code_language("syntax-code"), None);
    }

    #[test]
    fn each_parse_is_a_distinct_tree() {
        let first = HtmlTree::parse("<p>a</p>");
        let second = HtmlTree::parse("<p>a</p>");
        assert_ne!(first.root(), second.root());
        assert_eq!(first.root(), first.clone().root());
    }
}
