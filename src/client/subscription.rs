/// A live registration with a host (an observer, an event listener).
pub trait ObservationHandle {
    fn disconnect(&mut self);
}

/// Owns an [`ObservationHandle`] and releases it exactly once: on
/// [`Subscription::stop`] or when dropped, whichever comes first.
#[derive(Debug)]
pub struct Subscription<H: ObservationHandle> {
    handle: Option<H>,
}

impl<H: ObservationHandle> Subscription<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.disconnect();
        }
    }
}

impl<H: ObservationHandle> Drop for Subscription<H> {
    fn drop(&mut self) {
        self.stop();
    }
}
