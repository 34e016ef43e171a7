use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::warn;

use crate::{
    application::{
        documents::{DocumentOutcome, DocumentService},
        error::{ErrorReport, HttpError},
        render::{RenderError, THEME_CSS},
    },
    client::enhance_html,
    presentation::views::{
        DocumentTemplate, SYNTAX_CSS_PATH, render_not_found_response, render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub documents: Arc<DocumentService>,
}

impl HttpState {
    pub fn new(documents: DocumentService) -> Self {
        Self {
            documents: Arc::new(documents),
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/docs/{slug}", get(document_page))
        .route("/api/docs/{slug}", get(document_json))
        .route("/_health", get(health))
        .route(SYNTAX_CSS_PATH, get(syntax_css))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn document_page(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match lookup(&state, slug.clone()).await {
        Ok(DocumentOutcome::Found(document)) => {
            let content = enhanced_content(&slug, &document.html);
            let template = DocumentTemplate::from(document.as_ref()).with_content(content);
            render_template_response(template, StatusCode::OK)
        }
        Ok(DocumentOutcome::NotFound) => render_not_found_response(&slug),
        Err(err) => err.into_response(),
    }
}

async fn document_json(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    match lookup(&state, slug.clone()).await {
        Ok(DocumentOutcome::Found(document)) => Json(document.as_ref()).into_response(),
        Ok(DocumentOutcome::NotFound) => {
            let mut response =
                (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response();
            ErrorReport::from_message(
                "infra::http::public::document_json",
                StatusCode::NOT_FOUND,
                format!("document `{slug}` not found"),
            )
            .attach(&mut response);
            response
        }
        Err(err) => err.into_response(),
    }
}

/// Page body with code-block affordances; the plain render is served when
/// enhancement fails.
fn enhanced_content(slug: &str, html: &str) -> String {
    match enhance_html(html) {
        Ok(enhanced) => enhanced,
        Err(err) => {
            warn!(
                target = "infra::http::public",
                slug = %slug,
                error = %err,
                "code block enhancement failed; serving plain markup"
            );
            html.to_string()
        }
    }
}

async fn lookup(state: &HttpState, slug: String) -> Result<DocumentOutcome, HttpError> {
    let documents = Arc::clone(&state.documents);
    tokio::task::spawn_blocking(move || documents.render_document(&slug))
        .await
        .map_err(|err| {
            HttpError::from_error(
                "infra::http::public::lookup",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Document could not be rendered",
                &err,
            )
        })?
        .map_err(|err: RenderError| HttpError::from(err))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn syntax_css() -> Response {
    let mut response = THEME_CSS.into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/css; charset=utf-8"),
    );
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );
    response
}
