//! Code-block affordances: a language label and a copy button.
//!
//! Work is split into a pure [`scan`] that plans which blocks to wrap and an
//! [`apply`] that mutates the tree. [`CodeBlockEnhancer`] combines both and
//! remembers processed blocks, so enhancing the same tree again is a no-op.

use std::time::{Duration, Instant};

use html_escape::encode_text;
use thiserror::Error;
use tracing::debug;

use crate::dom::{self, DomError, HtmlTree, NodeRef};

/// How long a copy button reports success after an activation.
pub const COPY_FEEDBACK: Duration = Duration::from_millis(2000);

pub const WRAPPER_CLASS: &str = "code-block";
pub const HEADER_CLASS: &str = "code-block-header";
pub const LABEL_CLASS: &str = "code-block-language";
pub const COPY_BUTTON_ROLE: &str = "code-copy-button";

const COPY_LABEL: &str = "Copy code";
const COPIED_LABEL: &str = "Copied!";
const FALLBACK_LABEL: &str = "TEXT";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable")]
    Unavailable,
    #[error("clipboard write rejected: {message}")]
    Rejected { message: String },
}

pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    Idle,
    Copied,
}

impl CopyState {
    fn as_str(self) -> &'static str {
        match self {
            CopyState::Idle => "idle",
            CopyState::Copied => "copied",
        }
    }
}

/// Copy affordance for one block's literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyButton {
    text: String,
    copied_at: Option<Instant>,
}

impl CopyButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            copied_at: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Write the block text to `clipboard`. A successful write (re)starts the
    /// feedback window; a failed one leaves the state untouched.
    pub fn activate(&mut self, clipboard: &mut dyn Clipboard, now: Instant) -> CopyState {
        match clipboard.write_text(&self.text) {
            Ok(()) => self.copied_at = Some(now),
            Err(err) => {
                debug!(target = "client::enhancer", error = %err, "copy to clipboard failed");
            }
        }
        self.state(now)
    }

    pub fn state(&self, now: Instant) -> CopyState {
        match self.copied_at {
            Some(at) if now.saturating_duration_since(at) < COPY_FEEDBACK => CopyState::Copied,
            _ => CopyState::Idle,
        }
    }

    pub fn label(&self, now: Instant) -> &'static str {
        match self.state(now) {
            CopyState::Idle => COPY_LABEL,
            CopyState::Copied => COPIED_LABEL,
        }
    }
}

/// A block chosen for enhancement by [`scan`].
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockPlan {
    pub pre: NodeRef,
    /// Language from the `language-<name>` class, empty when absent.
    pub language: String,
    /// Decoded text content of the `<code>` element.
    pub text: String,
}

/// Nodes created around one block by [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedBlock {
    pub pre: NodeRef,
    pub wrapper: NodeRef,
    pub button: NodeRef,
}

/// Plan every `pre > code` block that is not already inside a wrapper.
pub fn scan(tree: &HtmlTree) -> Result<Vec<CodeBlockPlan>, DomError> {
    Ok(tree
        .select("pre")?
        .into_iter()
        .filter(|pre| {
            !pre.parent()
                .is_some_and(|parent| dom::has_class(&parent, WRAPPER_CLASS))
        })
        .filter_map(|pre| {
            let code = pre
                .children()
                .find(|child| dom::tag_name(child).as_deref() == Some("code"))?;
            let language = dom::attr(&code, "class")
                .as_deref()
                .and_then(dom::code_language)
                .unwrap_or_default()
                .to_string();
            let text = code.text_contents();
            Some(CodeBlockPlan {
                pre,
                language,
                text,
            })
        })
        .collect())
}

/// Wrap each planned `pre` in place:
///
/// ```html
/// <div class="code-block">
///   <div class="code-block-header">
///     <span class="code-block-language">RUST</span>
///     <button type="button" data-role="code-copy-button">Copy code</button>
///   </div>
///   <pre>…</pre>
/// </div>
/// ```
///
/// The `pre` node itself is moved, not copied, and its attributes are left alone.
pub fn apply(plans: &[CodeBlockPlan]) -> Result<Vec<EnhancedBlock>, DomError> {
    let mut enhanced = Vec::with_capacity(plans.len());

    for plan in plans {
        let markup = format!(
            "<div class=\"{WRAPPER_CLASS}\"><div class=\"{HEADER_CLASS}\">\
             <span class=\"{LABEL_CLASS}\">{label}</span>\
             <button type=\"button\" data-role=\"{COPY_BUTTON_ROLE}\" data-state=\"{state}\" aria-label=\"{COPY_LABEL}\">{COPY_LABEL}</button>\
             </div></div>",
            label = encode_text(&language_label(&plan.language)),
            state = CopyState::Idle.as_str(),
        );
        let wrapper = HtmlTree::create_element(&markup)?;
        let button = wrapper
            .select_first("button")
            .map(|button| button.as_node().clone())
            .map_err(|()| DomError::EmptyFragment {
                markup: markup.clone(),
            })?;

        plan.pre.insert_before(wrapper.clone());
        wrapper.append(plan.pre.clone());

        enhanced.push(EnhancedBlock {
            pre: plan.pre.clone(),
            wrapper,
            button,
        });
    }

    Ok(enhanced)
}

fn language_label(language: &str) -> String {
    if language.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        language.to_uppercase()
    }
}

/// Idempotent enhancer bound to one tree instance at a time.
#[derive(Debug, Default)]
pub struct CodeBlockEnhancer {
    tree: Option<NodeRef>,
    processed: Vec<NodeRef>,
    buttons: Vec<(NodeRef, CopyButton)>,
}

impl CodeBlockEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enhance every new block in `tree`. Returns the blocks wrapped by this call.
    pub fn enhance(&mut self, tree: &HtmlTree) -> Result<Vec<EnhancedBlock>, DomError> {
        if self.tree.as_ref() != Some(tree.root()) {
            self.processed.clear();
            self.buttons.clear();
            self.tree = Some(tree.root().clone());
        }

        let plans: Vec<CodeBlockPlan> = scan(tree)?
            .into_iter()
            .filter(|plan| !self.processed.contains(&plan.pre))
            .collect();

        let enhanced = apply(&plans)?;
        for (plan, block) in plans.into_iter().zip(&enhanced) {
            self.processed.push(plan.pre);
            self.buttons
                .push((block.button.clone(), CopyButton::new(plan.text)));
        }

        if !enhanced.is_empty() {
            debug!(
                target = "client::enhancer",
                blocks = enhanced.len(),
                "code blocks enhanced"
            );
        }
        Ok(enhanced)
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn button(&self, button: &NodeRef) -> Option<&CopyButton> {
        self.buttons
            .iter()
            .find(|(node, _)| node == button)
            .map(|(_, copy)| copy)
    }

    /// Handle a click on the copy button `button`.
    pub fn activate_copy(
        &mut self,
        button: &NodeRef,
        clipboard: &mut dyn Clipboard,
        now: Instant,
    ) -> Option<CopyState> {
        let (node, copy) = self.buttons.iter_mut().find(|(node, _)| node == button)?;
        let state = copy.activate(clipboard, now);
        render_button(node, copy, now);
        Some(state)
    }

    /// Refresh button labels for the current time, reverting expired feedback.
    pub fn tick(&self, now: Instant) {
        for (button, copy) in &self.buttons {
            render_button(button, copy, now);
        }
    }
}

fn render_button(button: &NodeRef, copy: &CopyButton, now: Instant) {
    dom::set_attr(button, "data-state", copy.state(now).as_str());
    dom::replace_text(button, copy.label(now));
}

/// Enhance every code block of a rendered HTML fragment and serialize it.
pub fn enhance_html(html: &str) -> Result<String, DomError> {
    let tree = HtmlTree::parse(html);
    CodeBlockEnhancer::new().enhance(&tree)?;
    Ok(tree.to_html())
}
