//! Streaming attribute pass over the serialized document.

use std::collections::BTreeSet;

use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::application::render::types::RenderError;

pub(crate) fn augment_semantics(html: &str) -> Result<String, RenderError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("img", |el| {
                    if el.get_attribute("loading").is_none() {
                        el.set_attribute("loading", "lazy")?;
                    }
                    if el.get_attribute("decoding").is_none() {
                        el.set_attribute("decoding", "async")?;
                    }
                    if el.get_attribute("alt").is_none() {
                        el.set_attribute("alt", "")?;
                    }
                    Ok(())
                }),
                element!("a[href]", |el| {
                    let Some(href) = el.get_attribute("href") else {
                        return Ok(());
                    };
                    match classify_link(&href) {
                        LinkKind::External => {
                            let rel = merge_rel(el.get_attribute("rel"), &["noopener", "noreferrer"]);
                            el.set_attribute("rel", &rel)?;
                            el.set_attribute("data-link-kind", "external")?;
                        }
                        LinkKind::Internal => el.set_attribute("data-link-kind", "internal")?,
                        LinkKind::Anchor => el.set_attribute("data-link-kind", "anchor")?,
                        LinkKind::Other => el.set_attribute("data-link-kind", "other")?,
                    }
                    Ok(())
                }),
                element!("pre[data-language]", |el| {
                    let Some(lang) = el.get_attribute("data-language") else {
                        return Ok(());
                    };
                    if el.get_attribute("role").is_none() {
                        el.set_attribute("role", "region")?;
                    }
                    let trimmed = lang.trim();
                    if el.get_attribute("aria-label").is_none() && !trimmed.is_empty() {
                        el.set_attribute("aria-label", &format!("Code block in {trimmed}"))?;
                    }
                    Ok(())
                }),
                element!("table", |el| {
                    if el.get_attribute("role").is_none() {
                        el.set_attribute("role", "table")?;
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Internal,
    External,
    Anchor,
    Other,
}

fn classify_link(href: &str) -> LinkKind {
    if href.is_empty() || href.starts_with('#') {
        return LinkKind::Anchor;
    }

    if href.starts_with("http://") || href.starts_with("https://") || href.starts_with("//") {
        return LinkKind::External;
    }

    if href.starts_with('/') || href.starts_with("./") || href.starts_with("../") || !href.contains(':')
    {
        return LinkKind::Internal;
    }

    LinkKind::Other
}

fn merge_rel(existing: Option<String>, required: &[&str]) -> String {
    let mut tokens: BTreeSet<String> = existing
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    for &token in required {
        tokens.insert(token.to_string());
    }
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_links_get_rel_and_kind() {
        let html = augment_semantics("<a href=\"https://example.com\" rel=\"nofollow\">x</a>")
            .expect("augment");
        assert!(html.contains("rel=\"nofollow noopener noreferrer\""));
        assert!(html.contains("data-link-kind=\"external\""));
    }

    #[test]
    fn anchor_and_internal_links_are_classified() {
        let html = augment_semantics("<a href=\"#intro\">a</a><a href=\"/docs/x\">b</a><a href=\"mailto:a@b.c\">c</a>")
            .expect("augment");
        assert!(html.contains("href=\"#intro\" data-link-kind=\"anchor\""));
        assert!(html.contains("href=\"/docs/x\" data-link-kind=\"internal\""));
        assert!(html.contains("href=\"mailto:a@b.c\" data-link-kind=\"other\""));
    }

    #[test]
    fn images_are_lazy_and_code_regions_labelled() {
        let html = augment_semantics(
            "<img src=\"a.png\" alt=\"A\" /><pre data-language=\"rust\"><code>x</code></pre>",
        )
        .expect("augment");
        assert!(html.contains("loading=\"lazy\""));
        assert!(html.contains("decoding=\"async\""));
        assert!(html.contains("role=\"region\""));
        assert!(html.contains("aria-label=\"Code block in rust\""));
    }
}
