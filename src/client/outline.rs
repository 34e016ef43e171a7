//! Table of contents with live active-section tracking.
//!
//! [`extract`] reads the outline from the document tree. The
//! [`OutlineController`] keeps one intersection subscription per mounted
//! tree and moves the active id as entries arrive.

use tracing::{debug, trace};

use crate::dom::HtmlTree;
use crate::domain::document::HeadingNode;

use super::subscription::{ObservationHandle, Subscription};

/// Distance kept between the viewport top and a heading after navigation.
pub const SCROLL_OFFSET_PX: f64 = 80.0;

/// Outline entries for every `h2`/`h3` with an id and visible text, in
/// document order.
pub fn extract(tree: &HtmlTree) -> Vec<HeadingNode> {
    tree.headings()
        .into_iter()
        .filter(|heading| matches!(heading.level, 2 | 3) && !heading.text.is_empty())
        .collect()
}

/// Vertical band of the viewport in which a heading counts as current.
///
/// The top `top_margin_px` pixels and the bottom `bottom_fraction` of the
/// viewport are excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationBand {
    pub top_margin_px: f64,
    pub bottom_fraction: f64,
}

impl Default for ObservationBand {
    fn default() -> Self {
        Self {
            top_margin_px: 100.0,
            bottom_fraction: 0.66,
        }
    }
}

impl ObservationBand {
    /// Root margin in the CSS shorthand intersection observers accept.
    pub fn root_margin(&self) -> String {
        let percent = (self.bottom_fraction * 100.0).round();
        format!("-{}px 0px -{}%", self.top_margin_px, percent)
    }

    /// Band bounds `(top, bottom)` in viewport coordinates.
    pub fn bounds(&self, viewport_height: f64) -> (f64, f64) {
        let bottom = viewport_height * (1.0 - self.bottom_fraction);
        (self.top_margin_px, bottom)
    }

    pub fn is_intersecting(&self, rect: ElementRect, viewport_height: f64) -> bool {
        let (top, bottom) = self.bounds(viewport_height);
        if bottom <= top {
            return false;
        }
        rect.top < bottom && rect.bottom >= top
    }
}

/// Element bounds relative to the viewport top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub id: String,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn new(id: impl Into<String>, is_intersecting: bool) -> Self {
        Self {
            id: id.into(),
            is_intersecting,
        }
    }
}

/// Host able to report when observed headings enter or leave the band.
pub trait IntersectionSource {
    type Handle: ObservationHandle;

    fn observe(&mut self, ids: &[String], band: &ObservationBand) -> Self::Handle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

pub trait Viewport {
    /// Top of the element with `id`, relative to the viewport.
    fn bounding_top(&self, id: &str) -> Option<f64>;

    /// Current vertical scroll offset of the page.
    fn page_offset(&self) -> f64;

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
}

/// `None` until an intersecting entry arrives, then the id of the most recent one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActiveSectionTracker {
    active: Option<String>,
}

impl ActiveSectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Apply a batch in delivery order; the last intersecting entry wins.
    /// Returns whether the active id changed.
    pub fn apply(&mut self, entries: &[IntersectionEntry]) -> bool {
        let Some(last) = entries.iter().rev().find(|entry| entry.is_intersecting) else {
            return false;
        };
        if self.active.as_deref() == Some(last.id.as_str()) {
            return false;
        }
        self.active = Some(last.id.clone());
        true
    }

    pub fn reset(&mut self) {
        self.active = None;
    }
}

pub struct OutlineController<S: IntersectionSource> {
    source: S,
    band: ObservationBand,
    headings: Vec<HeadingNode>,
    tracker: ActiveSectionTracker,
    subscription: Option<Subscription<S::Handle>>,
}

impl<S: IntersectionSource> OutlineController<S> {
    pub fn new(source: S) -> Self {
        Self::with_band(source, ObservationBand::default())
    }

    pub fn with_band(source: S, band: ObservationBand) -> Self {
        Self {
            source,
            band,
            headings: Vec::new(),
            tracker: ActiveSectionTracker::new(),
            subscription: None,
        }
    }

    /// Re-extract the outline from `tree` and observe its headings.
    ///
    /// Any previous subscription is released first and the active id is
    /// cleared, so nothing from earlier content survives.
    pub fn mount(&mut self, tree: &HtmlTree) {
        self.unmount();

        self.headings = extract(tree);
        if self.headings.is_empty() {
            return;
        }

        let ids: Vec<String> = self.headings.iter().map(|h| h.id.clone()).collect();
        let handle = self.source.observe(&ids, &self.band);
        self.subscription = Some(Subscription::new(handle));

        debug!(
            target = "client::outline",
            headings = ids.len(),
            root_margin = %self.band.root_margin(),
            "outline mounted"
        );
    }

    pub fn unmount(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.stop();
        }
        self.headings.clear();
        self.tracker.reset();
    }

    /// Feed an intersection batch; entries for ids outside the current
    /// outline are ignored. Returns the active id afterwards.
    pub fn on_intersections(&mut self, entries: &[IntersectionEntry]) -> Option<&str> {
        let relevant: Vec<IntersectionEntry> = entries
            .iter()
            .filter(|entry| self.headings.iter().any(|h| h.id == entry.id))
            .cloned()
            .collect();

        if self.tracker.apply(&relevant) {
            trace!(
                target = "client::outline",
                active = ?self.tracker.active(),
                "active section changed"
            );
        }
        self.tracker.active()
    }

    /// Smoothly scroll so the heading with `id` sits just below the top edge.
    pub fn scroll_to<V: Viewport>(&self, viewport: &mut V, id: &str) -> bool {
        let Some(rect_top) = viewport.bounding_top(id) else {
            return false;
        };
        let target = rect_top + viewport.page_offset() - SCROLL_OFFSET_PX;
        viewport.scroll_to(target, ScrollBehavior::Smooth);
        true
    }

    pub fn headings(&self) -> &[HeadingNode] {
        &self.headings
    }

    pub fn active_id(&self) -> Option<&str> {
        self.tracker.active()
    }

    pub fn is_observing(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }
}
