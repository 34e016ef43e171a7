//! File-backed document source.
//!
//! A slug maps to `<root>/<slug>.<extension>`. Slugs are opaque, but anything
//! that could name a file outside the root is rejected before touching disk.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::application::front_matter;
use crate::domain::document::{SourceDocument, SourceFingerprint};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("document `{slug}` not found")]
    NotFound { slug: String },
    #[error("document slug `{slug}` rejected: {reason}")]
    Rejected { slug: String, reason: &'static str },
    #[error("failed to read document `{slug}`: {source}")]
    Read {
        slug: String,
        #[source]
        source: io::Error,
    },
}

/// Read-only access to documents by slug.
pub trait DocumentSource: Send + Sync {
    fn load(&self, slug: &str) -> Result<SourceDocument, SourceError>;

    /// Identity of the current source without reading its content.
    fn fingerprint(&self, slug: &str) -> Result<SourceFingerprint, SourceError>;
}

#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    root: PathBuf,
    extension: String,
}

impl FsDocumentSource {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a slug to a path that is guaranteed to live under the root.
    fn resolve(&self, slug: &str) -> Result<PathBuf, SourceError> {
        validate_slug(slug)?;

        let candidate = self.root.join(format!("{slug}.{}", self.extension));
        let canonical = match candidate.canonicalize() {
            Ok(path) => path,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    slug: slug.to_string(),
                });
            }
            Err(source) => {
                return Err(SourceError::Read {
                    slug: slug.to_string(),
                    source,
                });
            }
        };

        let root = self.root.canonicalize().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SourceError::NotFound {
                    slug: slug.to_string(),
                }
            } else {
                SourceError::Read {
                    slug: slug.to_string(),
                    source,
                }
            }
        })?;

        if !canonical.starts_with(&root) {
            return Err(SourceError::Rejected {
                slug: slug.to_string(),
                reason: "resolves outside the document root",
            });
        }

        if !canonical.is_file() {
            return Err(SourceError::NotFound {
                slug: slug.to_string(),
            });
        }

        Ok(canonical)
    }
}

impl DocumentSource for FsDocumentSource {
    fn load(&self, slug: &str) -> Result<SourceDocument, SourceError> {
        let path = self.resolve(slug)?;
        let fingerprint = stat(&path, slug)?;
        let raw = fs::read_to_string(&path).map_err(|source| read_error(slug, source))?;

        let extracted = front_matter::extract(&raw);
        let metadata = extracted.metadata.unwrap_or_else(|err| {
            warn!(
                target = "application::loader",
                slug,
                error = %err,
                "front matter ignored"
            );
            Default::default()
        });

        Ok(SourceDocument {
            slug: slug.to_string(),
            metadata,
            body: extracted.body.to_string(),
            fingerprint,
        })
    }

    fn fingerprint(&self, slug: &str) -> Result<SourceFingerprint, SourceError> {
        let path = self.resolve(slug)?;
        stat(&path, slug)
    }
}

fn validate_slug(slug: &str) -> Result<(), SourceError> {
    let reject = |reason| {
        Err(SourceError::Rejected {
            slug: slug.to_string(),
            reason,
        })
    };

    if slug.trim().is_empty() {
        return reject("empty slug");
    }
    if slug.contains(['/', '\\', '\0']) {
        return reject("contains a path separator");
    }
    if slug.starts_with('.') {
        return reject("starts with a dot");
    }

    let mut components = Path::new(slug).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => reject("not a single path segment"),
    }
}

fn stat(path: &Path, slug: &str) -> Result<SourceFingerprint, SourceError> {
    let metadata = fs::metadata(path).map_err(|source| read_error(slug, source))?;
    Ok(SourceFingerprint {
        modified: metadata.modified().ok(),
        len: metadata.len(),
    })
}

fn read_error(slug: &str, source: io::Error) -> SourceError {
    if source.kind() == io::ErrorKind::NotFound {
        SourceError::NotFound {
            slug: slug.to_string(),
        }
    } else {
        SourceError::Read {
            slug: slug.to_string(),
            source,
        }
    }
}
