//! Reading progress as a percentage of the scrollable distance.

use super::subscription::{ObservationHandle, Subscription};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Progress in `[0, 100]`; zero when the content fits in the viewport.
    pub fn progress(&self) -> f64 {
        let scrollable = self.document_height - self.viewport_height;
        if scrollable <= 0.0 || !scrollable.is_finite() {
            return 0.0;
        }
        let progress = self.scroll_top / scrollable * 100.0;
        if !progress.is_finite() {
            return 0.0;
        }
        progress.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEvent {
    Scroll,
    Resize,
}

/// Window-like host delivering scroll and resize events.
pub trait ScrollHost {
    type Handle: ObservationHandle;

    /// Register for scroll and resize notifications.
    fn listen(&mut self) -> Self::Handle;

    fn metrics(&self) -> ScrollMetrics;
}

pub struct ScrollTracker<H: ScrollHost> {
    host: H,
    subscription: Option<Subscription<H::Handle>>,
    progress: f64,
}

impl<H: ScrollHost> ScrollTracker<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            subscription: None,
            progress: 0.0,
        }
    }

    /// Start listening and compute the initial progress.
    pub fn attach(&mut self) -> f64 {
        if let Some(mut previous) = self.subscription.take() {
            previous.stop();
        }
        self.subscription = Some(Subscription::new(self.host.listen()));
        self.recompute()
    }

    pub fn on_event(&mut self, _event: ScrollEvent) -> f64 {
        self.recompute()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn detach(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.stop();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn recompute(&mut self) -> f64 {
        self.progress = self.host.metrics().progress();
        self.progress
    }
}
