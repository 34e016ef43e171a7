//! Reader-side behaviour over a rendered document.
//!
//! These components run against the headless [`HtmlTree`](crate::dom::HtmlTree);
//! everything a browser would provide (clipboard, intersection observation,
//! scrolling, event listeners) is reached through the traits defined here.

pub mod enhancer;
pub mod outline;
pub mod scroll;
pub mod subscription;

pub use enhancer::{
    Clipboard, ClipboardError, CodeBlockEnhancer, CodeBlockPlan, CopyButton, CopyState,
    EnhancedBlock, enhance_html,
};
pub use outline::{
    ActiveSectionTracker, ElementRect, IntersectionEntry, IntersectionSource, ObservationBand,
    OutlineController, ScrollBehavior, Viewport,
};
pub use scroll::{ScrollEvent, ScrollHost, ScrollMetrics, ScrollTracker};
pub use subscription::{ObservationHandle, Subscription};
