use crate::application::error::{ErrorReport, HttpError};
use crate::domain::document::{HeadingNode, RenderedDocument};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Path the highlight theme stylesheet is served from.
pub const SYNTAX_CSS_PATH: &str = "/assets/syntax.css";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(slug: &str) -> Response {
    let template = NotFoundTemplate {
        slug: slug.to_string(),
        stylesheet: SYNTAX_CSS_PATH,
    };
    let mut response = render_template_response(template, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        format!("document `{slug}` not found"),
    )
    .attach(&mut response);
    response
}

/// Outline entry as rendered in the page sidebar.
#[derive(Clone)]
pub struct OutlineLinkView {
    pub href: String,
    pub text: String,
    pub nested: bool,
}

impl From<&HeadingNode> for OutlineLinkView {
    fn from(heading: &HeadingNode) -> Self {
        Self {
            href: format!("#{}", heading.id),
            text: heading.text.clone(),
            nested: heading.level > 2,
        }
    }
}

#[derive(Template)]
#[template(path = "document.html")]
pub struct DocumentTemplate {
    pub title: String,
    pub slug: String,
    pub reading_time_label: String,
    pub outline: Vec<OutlineLinkView>,
    pub content: String,
    pub stylesheet: &'static str,
}

impl From<&RenderedDocument> for DocumentTemplate {
    fn from(document: &RenderedDocument) -> Self {
        Self {
            title: document.title.clone(),
            slug: document.slug.clone(),
            reading_time_label: format!("{} min read", document.reading_time_minutes),
            outline: document.outline.iter().map(OutlineLinkView::from).collect(),
            content: document.html.clone(),
            stylesheet: SYNTAX_CSS_PATH,
        }
    }
}

impl DocumentTemplate {
    /// Swap the page body, keeping title and outline.
    pub fn with_content(mut self, content: String) -> Self {
        self.content = content;
        self
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub slug: String,
    pub stylesheet: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn document() -> RenderedDocument {
        RenderedDocument {
            slug: "guide".into(),
            html: "<h2 id=\"install\">Install</h2>".into(),
            title: "Guide <beta>".into(),
            reading_time_minutes: 3,
            outline: vec![
                HeadingNode {
                    id: "install".into(),
                    text: "Install".into(),
                    level: 2,
                },
                HeadingNode {
                    id: "linux".into(),
                    text: "Linux".into(),
                    level: 3,
                },
            ],
            extra: Map::new(),
        }
    }

    #[test]
    fn document_template_embeds_html_and_escapes_title() {
        let html = DocumentTemplate::from(&document()).render().expect("render");

        assert!(html.contains("<h2 id=\"install\">Install</h2>"));
        assert!(html.contains("Guide &#60;beta&#62;") || html.contains("Guide &lt;beta&gt;"));
        assert!(html.contains("3 min read"));
        assert!(html.contains("href=\"#linux\""));
        assert!(html.contains(SYNTAX_CSS_PATH));
    }

    #[test]
    fn outline_marks_nested_levels() {
        let views: Vec<OutlineLinkView> = document().outline.iter().map(Into::into).collect();
        assert!(!views[0].nested);
        assert!(views[1].nested);
    }

    #[test]
    fn not_found_response_carries_report() {
        let response = render_not_found_response("missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let report = response.extensions().get::<ErrorReport>().expect("report");
        assert!(report.messages[0].contains("missing"));
    }
}
