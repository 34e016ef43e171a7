//! Loader → cache → pipeline → reading time.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::application::loader::{DocumentSource, SourceError};
use crate::application::reading_time;
use crate::application::render::{RenderError, RenderRequest, RenderService};
use crate::cache::DocumentCache;
use crate::domain::document::{HeadingNode, RenderedDocument, SourceDocument};

pub const METRIC_RENDER_TOTAL: &str = "leafdoc_render_total";
pub const METRIC_RENDER_MS: &str = "leafdoc_render_ms";
pub const METRIC_NOT_FOUND_TOTAL: &str = "leafdoc_document_not_found_total";

/// Heading levels exposed in a document outline.
pub const OUTLINE_LEVELS: std::ops::RangeInclusive<u8> = 2..=3;

/// Result of looking a document up by slug.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Found(Arc<RenderedDocument>),
    NotFound,
}

impl DocumentOutcome {
    pub fn found(self) -> Option<Arc<RenderedDocument>> {
        match self {
            DocumentOutcome::Found(document) => Some(document),
            DocumentOutcome::NotFound => None,
        }
    }
}

pub struct DocumentService {
    source: Arc<dyn DocumentSource>,
    renderer: Arc<dyn RenderService>,
    cache: Option<DocumentCache>,
}

impl DocumentService {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        renderer: Arc<dyn RenderService>,
        cache: Option<DocumentCache>,
    ) -> Self {
        Self {
            source,
            renderer,
            cache,
        }
    }

    /// Render the document behind `slug`.
    ///
    /// Unknown, rejected and unreadable slugs all resolve to
    /// [`DocumentOutcome::NotFound`]; only pipeline defects are errors.
    pub fn render_document(&self, slug: &str) -> Result<DocumentOutcome, RenderError> {
        if let Some(cache) = &self.cache {
            match self.source.fingerprint(slug) {
                Ok(fingerprint) => {
                    if let Some(document) = cache.get(slug, &fingerprint) {
                        debug!(target = "application::documents", slug, "document cache hit");
                        return Ok(DocumentOutcome::Found(document));
                    }
                }
                Err(err) => return Ok(self.not_found(slug, &err)),
            }
        }

        let source = match self.source.load(slug) {
            Ok(source) => source,
            Err(err) => return Ok(self.not_found(slug, &err)),
        };

        let fingerprint = source.fingerprint;
        let document = Arc::new(self.render_source(source)?);

        if let Some(cache) = &self.cache {
            cache.put(slug, fingerprint, Arc::clone(&document));
        }

        Ok(DocumentOutcome::Found(document))
    }

    fn render_source(&self, source: SourceDocument) -> Result<RenderedDocument, RenderError> {
        let started_at = Instant::now();
        let request = RenderRequest::new(source.slug.as_str(), source.body.as_str());

        let output = match self.renderer.render(&request) {
            Ok(output) => output,
            Err(err) => {
                counter!(METRIC_RENDER_TOTAL, "result" => "error").increment(1);
                return Err(err);
            }
        };

        counter!(METRIC_RENDER_TOTAL, "result" => "ok").increment(1);
        histogram!(METRIC_RENDER_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        let outline: Vec<HeadingNode> = output
            .headings
            .into_iter()
            .filter(|heading| OUTLINE_LEVELS.contains(&heading.level) && !heading.text.is_empty())
            .collect();

        let title = source
            .metadata
            .title
            .clone()
            .unwrap_or_else(|| source.slug.clone());

        debug!(
            target = "application::documents",
            slug = %source.slug,
            headings = outline.len(),
            code_blocks = output.code_blocks,
            "document rendered"
        );

        Ok(RenderedDocument {
            reading_time_minutes: reading_time::estimate(&source.body),
            slug: source.slug,
            html: output.html,
            title,
            outline,
            extra: source.metadata.extra,
        })
    }

    fn not_found(&self, slug: &str, error: &SourceError) -> DocumentOutcome {
        match error {
            SourceError::Read { .. } => warn!(
                target = "application::documents",
                slug,
                error = %error,
                "document unreadable; treating as not found"
            ),
            SourceError::Rejected { .. } => debug!(
                target = "application::documents",
                slug,
                error = %error,
                "document slug rejected"
            ),
            SourceError::NotFound { .. } => {}
        }
        counter!(METRIC_NOT_FOUND_TOTAL).increment(1);
        DocumentOutcome::NotFound
    }
}
