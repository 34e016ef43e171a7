use std::{cell::RefCell, num::NonZeroUsize, rc::Rc, sync::Arc, time::Instant};

use leafdoc::{
    application::{
        documents::{DocumentOutcome, DocumentService},
        loader::FsDocumentSource,
        render::{ComrakRenderService, RenderRequest, RenderService},
    },
    cache::DocumentCache,
    client::{
        Clipboard, ClipboardError, CodeBlockEnhancer, CopyState, IntersectionEntry,
        IntersectionSource, ObservationBand, ObservationHandle, OutlineController, outline,
    },
    dom::HtmlTree,
};

fn load_markdown() -> String {
    include_str!("fixtures/guide.md").to_string()
}

fn document_service(dir: &tempfile::TempDir) -> DocumentService {
    DocumentService::new(
        Arc::new(FsDocumentSource::new(dir.path(), "md")),
        Arc::new(ComrakRenderService::default()),
        Some(DocumentCache::new(NonZeroUsize::new(4).expect("non-zero"))),
    )
}

fn render_fixture() -> Arc<leafdoc::domain::document::RenderedDocument> {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("guide.md"), load_markdown()).expect("write fixture");
    document_service(&dir)
        .render_document("guide")
        .expect("render succeeds")
        .found()
        .expect("fixture exists")
}

#[test]
fn fixture_renders_title_outline_and_reading_time() {
    let document = render_fixture();

    assert_eq!(document.title, "Getting Started");
    assert_eq!(document.reading_time_minutes, 1);
    assert_eq!(
        document.extra.get("section"),
        Some(&serde_json::Value::String("basics".into()))
    );

    let ids: Vec<&str> = document.outline.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(
        ids,
        ["install", "linux", "macos", "install-2", "kuai-su-kai-shi"]
    );
    let levels: Vec<u8> = document.outline.iter().map(|h| h.level).collect();
    assert_eq!(levels, [2, 3, 3, 2, 2]);
}

#[test]
fn fixture_code_blocks_are_highlighted_and_labelled() {
    let document = render_fixture();

    assert!(document.html.contains("data-language=\"rust\""));
    assert!(document.html.contains("class=\"syntax-highlight\""));
    assert!(document.html.contains("data-language=\"text\""));
    assert!(document.html.contains("aria-label=\"Code block in rust\""));
    assert!(!document.html.contains("<script"));
}

#[test]
fn fixture_code_blocks_carry_line_numbers() {
    let document = render_fixture();

    assert!(document.html.contains("data-line-numbers=\"3\""));
    assert!(document.html.contains("data-line-numbers=\"1\""));
}

#[test]
fn raw_html_passes_through_and_outline_matches_the_page() {
    let markdown = "<p>a &times; b &rarr; c &eacute;</p>\n\n\
                    <script>if (a < b && c > d) { x(); }</script>\n\n\
                    <h2 id=\" spaced \">Spaced</h2>\n\n\
                    ## After Script\n\n\
                    <h2 id=\"dup\">One</h2>\n\n\
                    <h3 id=\"dup\">Two</h3>\n";
    let output = ComrakRenderService::default()
        .render(&RenderRequest::new("raw", markdown))
        .expect("render");

    assert!(output.html.contains("<p>a &times; b &rarr; c &eacute;</p>"));
    assert!(output.html.contains("<script>if (a < b && c > d) { x(); }</script>"));

    let page = HtmlTree::parse(&output.html);
    let outline: Vec<_> = outline::extract(&page).into_iter().map(|h| h.id).collect();
    assert_eq!(outline, ["spaced", "after-script", "dup", "dup-2"]);
    assert_eq!(page.headings(), output.headings);
    for id in &outline {
        let selector = format!("[id=\"{id}\"]");
        assert_eq!(page.select(&selector).expect("select").len(), 1, "{id}");
    }
}

#[test]
fn rerendering_is_deterministic() {
    let renderer = ComrakRenderService::default();
    let request = RenderRequest::new("guide", load_markdown());

    let first = renderer.render(&request).expect("first render");
    let second = renderer.render(&request).expect("second render");

    assert_eq!(first, second);
}

#[test]
fn missing_document_is_not_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = document_service(&dir)
        .render_document("absent")
        .expect("lookup succeeds");

    assert_eq!(outcome, DocumentOutcome::NotFound);
}

#[derive(Default)]
struct RecordingClipboard {
    writes: Vec<String>,
}

impl Clipboard for RecordingClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.writes.push(text.to_string());
        Ok(())
    }
}

#[test]
fn enhancer_wraps_rendered_blocks_once_and_copies_literal_text() {
    let document = render_fixture();
    let tree = HtmlTree::parse(&document.html);
    let mut enhancer = CodeBlockEnhancer::new();

    let blocks = enhancer.enhance(&tree).expect("enhance");
    assert_eq!(blocks.len(), 2);
    assert!(enhancer.enhance(&tree).expect("re-enhance").is_empty());

    let html = tree.to_html();
    assert_eq!(html.matches("class=\"code-block\"").count(), 2);
    assert!(html.contains(">RUST<"));
    assert!(html.contains(">TEXT<"));

    let mut clipboard = RecordingClipboard::default();
    let state = enhancer
        .activate_copy(&blocks[0].button, &mut clipboard, Instant::now())
        .expect("known button");

    assert_eq!(state, CopyState::Copied);
    assert_eq!(clipboard.writes.len(), 1);
    assert!(clipboard.writes[0].starts_with("fn main() {"));
    assert!(clipboard.writes[0].contains("println!(\"a < b && c > d\");"));
    assert!(!clipboard.writes[0].contains("<span>1</span>"));
}

#[derive(Clone, Default)]
struct FakeObserver {
    observed: Rc<RefCell<Vec<Vec<String>>>>,
    disconnects: Rc<RefCell<usize>>,
}

struct FakeHandle {
    disconnects: Rc<RefCell<usize>>,
}

impl ObservationHandle for FakeHandle {
    fn disconnect(&mut self) {
        *self.disconnects.borrow_mut() += 1;
    }
}

impl IntersectionSource for FakeObserver {
    type Handle = FakeHandle;

    fn observe(&mut self, ids: &[String], _band: &ObservationBand) -> FakeHandle {
        self.observed.borrow_mut().push(ids.to_vec());
        FakeHandle {
            disconnects: Rc::clone(&self.disconnects),
        }
    }
}

#[test]
fn outline_controller_tracks_rendered_headings() {
    let document = render_fixture();
    let tree = HtmlTree::parse(&document.html);

    assert_eq!(outline::extract(&tree), document.outline);

    let observer = FakeObserver::default();
    let mut controller = OutlineController::new(observer.clone());
    controller.mount(&tree);

    assert_eq!(observer.observed.borrow().len(), 1);
    assert_eq!(controller.active_id(), None);

    let active = controller.on_intersections(&[
        IntersectionEntry::new("install", true),
        IntersectionEntry::new("linux", true),
    ]);
    assert_eq!(active, Some("linux"));

    controller.unmount();
    assert_eq!(*observer.disconnects.borrow(), 1);
    assert_eq!(controller.active_id(), None);
}
